//! Account rules shared by every service that creates users
//!
//! Field validation and password hashing live here so that self-registration
//! in the auth service and admin provisioning in the HR service accept and
//! store exactly the same data.

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::{Rng, distributions::Alphanumeric};
use regex::Regex;
use std::sync::OnceLock;

/// Validate an employee id
pub fn validate_employee_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("Employee id is required".to_string());
    }

    if id.len() > 32 {
        return Err("Employee id must be at most 32 characters long".to_string());
    }

    static EMPLOYEE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMPLOYEE_ID_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile employee id regex"));

    if !regex.is_match(id) {
        return Err(
            "Employee id can only contain letters, numbers, dashes and underscores".to_string(),
        );
    }

    Ok(())
}

/// Validate a 13-digit national id
pub fn validate_national_id(national_id: &str) -> Result<(), String> {
    static NATIONAL_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NATIONAL_ID_REGEX
        .get_or_init(|| Regex::new(r"^\d{13}$").expect("Failed to compile national id regex"));

    if !regex.is_match(national_id) {
        return Err("National id must be exactly 13 digits".to_string());
    }

    Ok(())
}

/// Validate a LINE user id (`U` followed by 32 hex digits)
pub fn validate_line_user_id(line_user_id: &str) -> Result<(), String> {
    static LINE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = LINE_ID_REGEX
        .get_or_init(|| Regex::new(r"^U[0-9a-f]{32}$").expect("Failed to compile LINE id regex"));

    if !regex.is_match(line_user_id) {
        return Err("Invalid LINE user id".to_string());
    }

    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{} is required", field));
    }

    if value.chars().count() > max_len {
        return Err(format!("{} must be at most {} characters long", field, max_len));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Validate the identity fields every account carries
pub fn validate_profile(
    id: &str,
    name: &str,
    national_id: &str,
    professional_id: &str,
    department: &str,
) -> Result<(), String> {
    validate_employee_id(id)?;
    validate_required("Name", name, 100)?;
    validate_national_id(national_id)?;
    validate_required("Professional id", professional_id, 64)?;
    validate_required("Department", department, 100)
}

/// Default avatar for a new account
pub fn avatar_for(id: &str) -> String {
    format!("https://picsum.photos/seed/{}/200", id)
}

/// Hash a password with argon2 and a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(hash)
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Unguessable secret for accounts that never log in with a password
pub fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_id_must_be_thirteen_digits() {
        assert!(validate_national_id("1103700012345").is_ok());
        assert!(validate_national_id("110370001234").is_err());
        assert!(validate_national_id("11037000123456").is_err());
        assert!(validate_national_id("11037000123ab").is_err());
    }

    #[test]
    fn employee_id_rejects_spaces_and_empty() {
        assert!(validate_employee_id("EMP-001_a").is_ok());
        assert!(validate_employee_id("").is_err());
        assert!(validate_employee_id("EMP 001").is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            validate_profile("EMP001", "   ", "1103700012345", "P-001", "IT").unwrap_err(),
            "Name is required"
        );
    }

    #[test]
    fn password_needs_letters_and_digits() {
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("letters123").is_ok());
    }

    #[test]
    fn line_user_id_format() {
        assert!(validate_line_user_id("U4af4980629b2b9e1b7ad8a1e4a8b1c2d").is_ok());
        assert!(validate_line_user_id("u4af4980629b2b9e1b7ad8a1e4a8b1c2d").is_err());
        assert!(validate_line_user_id("U123").is_err());
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("letters123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "letters123").unwrap());
        assert!(!verify_password(&hash, "letters124").unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(
            hash_password("letters123").unwrap(),
            hash_password("letters123").unwrap()
        );
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("not-a-hash", "letters123").is_err());
    }

    #[test]
    fn random_secrets_differ() {
        let secret = random_secret();
        assert_eq!(secret.len(), 32);
        assert_ne!(secret, random_secret());
    }
}
