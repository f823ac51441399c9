//! Authentication middleware for JWT token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::claims::{Claims, TokenType};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tracing::{debug, warn};

use crate::{error::ApiError, models::AuthUser, state::AppState};

/// Verifies access tokens issued by the auth service
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build from a PEM encoded RSA public key
    pub fn from_rsa_pem(public_key: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key: DecodingKey::from_rsa_pem(public_key)?,
            validation,
        })
    }

    /// Load the key from `JWT_PUBLIC_KEY`, either the PEM itself or a path to it
    pub fn from_env() -> anyhow::Result<Self> {
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .map_err(|e| anyhow::anyhow!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Ok(Self::from_rsa_pem(public_key.as_bytes())?)
    }

    /// Decode an access token into the caller it names
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, ApiError> {
        let claims =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
                .map_err(|e| {
                    debug!("Rejected bearer token: {}", e);
                    ApiError::Unauthorized
                })?
                .claims;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Require a valid access token and expose the caller as `AuthUser`
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;
    let user = state.jwt.authenticate(bearer.token())?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Allow only the configured administrative role through
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;

    if user.role != state.config.authority.admin_role {
        warn!(
            target: "audit",
            actor_id = %user.id,
            actor_role = %user.role,
            path = %req.uri().path(),
            "admin route denied"
        );
        return Err(ApiError::Forbidden("administrator role required".to_string()));
    }

    Ok(next.run(req).await)
}
