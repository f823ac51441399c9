//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{LineRegisterRequest, LoginCredentials, NewUser, RegisterRequest, User};
