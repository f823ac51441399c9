//! JWT service for token generation, validation, and management
//!
//! Tokens are RS256-signed and carry the shared `common::claims::Claims`, so
//! the HR service can verify them with the public key alone. Refresh tokens
//! rotate on every use and spent ones are blacklisted in Redis by token id.

use anyhow::Result;
use common::{
    cache::RedisPool,
    claims::{Claims, TokenType},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key (PEM) or path to the private key file
    /// - `JWT_PUBLIC_KEY`: Public key (PEM) or path to the public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let private_key = read_key("JWT_PRIVATE_KEY")?;
        let public_key = read_key("JWT_PUBLIC_KEY")?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(604800);

        Ok(JwtConfig {
            private_key,
            public_key,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Inline PEM, or a file path resolved against the working directory then the crate root
fn read_key(var: &str) -> Result<String> {
    let value = std::env::var(var)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?;

    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    let contents = std::fs::read_to_string(&value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(&value);
            std::fs::read_to_string(path)
        })
        .map_err(|e| anyhow::anyhow!("Failed to read {} file: {}", var, e))?;

    Ok(contents.trim().to_string())
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

fn blacklist_key(claims: &Claims) -> String {
    format!("blacklisted_token:{}", claims.jti)
}

/// Access and refresh token pair returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    fn sign(&self, user: &User, token_type: TokenType, ttl: u64) -> Result<String> {
        let now = now_secs()?;
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now + ttl,
            token_type,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.sign(user, TokenType::Access, self.config.access_token_expiry)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.sign(user, TokenType::Refresh, self.config.refresh_token_expiry)
    }

    /// Issue a fresh access/refresh pair
    pub fn issue(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiry,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Check if a token is blacklisted in Redis
    pub async fn is_token_blacklisted(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<bool> {
        redis_pool.exists(&blacklist_key(claims)).await
    }

    /// Blacklist a token for the rest of its lifetime
    pub async fn blacklist_token(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<()> {
        let remaining = claims.exp.saturating_sub(now_secs()?);
        redis_pool
            .set(&blacklist_key(claims), "1", Some(remaining))
            .await
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }

    /// Rotate a refresh token
    ///
    /// Blacklists the presented refresh token and issues a new pair for `user`.
    pub async fn rotate_refresh_token(
        &self,
        redis_pool: &RedisPool,
        user: &User,
        old: &Claims,
    ) -> Result<TokenPair> {
        if old.token_type != TokenType::Refresh {
            return Err(anyhow::anyhow!("Token is not a refresh token"));
        }

        if old.sub != user.id {
            return Err(anyhow::anyhow!("Token does not belong to user"));
        }

        self.blacklist_token(redis_pool, old).await?;
        info!(user_id = %user.id, "Rotated refresh token");

        self.issue(user)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    const PRIVATE_KEY: &str = include_str!("../../../testdata/jwt_private.pem");
    const PUBLIC_KEY: &str = include_str!("../../../testdata/jwt_public.pem");

    pub(crate) fn service() -> JwtService {
        JwtService::new(JwtConfig {
            private_key: PRIVATE_KEY.to_string(),
            public_key: PUBLIC_KEY.to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
        .unwrap()
    }

    pub(crate) fn user(id: &str, role: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("User {}", id),
            national_id: "1103700012345".to_string(),
            professional_id: "P-001".to_string(),
            department: "IT".to_string(),
            avatar: String::new(),
            role: role.to_string(),
            supervisor_id: None,
            manager_id: None,
            line_user_id: None,
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_carries_id_and_role() {
        let jwt = service();
        let token = jwt.generate_access_token(&user("EMP001", "Manager")).unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "EMP001");
        assert_eq!(claims.role, "Manager");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn issued_pair_has_distinct_token_ids() {
        let jwt = service();
        let pair = jwt.issue(&user("EMP001", "Employee")).unwrap();
        let access = jwt.validate_token(&pair.access_token).unwrap();
        let refresh = jwt.validate_token(&pair.refresh_token).unwrap();

        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_ne!(access.jti, refresh.jti);
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = service();
        let token = jwt.generate_access_token(&user("EMP001", "Employee")).unwrap();
        let other = jwt.generate_access_token(&user("EMP999", "Administrator")).unwrap();
        let forged_payload = other.split('.').nth(1).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload;

        assert!(jwt.validate_token(&parts.join(".")).is_err());
    }

    #[tokio::test]
    async fn rotation_requires_own_refresh_token() {
        use common::cache::RedisConfig;

        // Never contacted: both checks fail before Redis is touched
        let redis = RedisPool::new(&RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
            key_prefix: "test".to_string(),
        })
        .await
        .unwrap();
        let jwt = service();
        let owner = user("EMP001", "Employee");

        let access = jwt
            .validate_token(&jwt.generate_access_token(&owner).unwrap())
            .unwrap();
        tokio_test::assert_err!(jwt.rotate_refresh_token(&redis, &owner, &access).await);

        let someone_elses = jwt
            .validate_token(&jwt.generate_refresh_token(&user("EMP002", "Employee")).unwrap())
            .unwrap();
        tokio_test::assert_err!(
            jwt.rotate_refresh_token(&redis, &owner, &someone_elses).await
        );
    }

    #[test]
    #[serial_test::serial]
    fn config_reads_inline_keys_and_default_expiry() {
        unsafe {
            std::env::set_var("JWT_PRIVATE_KEY", PRIVATE_KEY);
            std::env::set_var("JWT_PUBLIC_KEY", PUBLIC_KEY);
            std::env::remove_var("JWT_ACCESS_TOKEN_EXPIRY");
            std::env::set_var("JWT_REFRESH_TOKEN_EXPIRY", "not-a-number");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 604800);
        assert!(JwtService::new(config).is_ok());

        unsafe {
            std::env::set_var("JWT_PUBLIC_KEY", "no/such/key.pem");
        }
        assert!(JwtConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("JWT_PRIVATE_KEY");
            std::env::remove_var("JWT_PUBLIC_KEY");
            std::env::remove_var("JWT_REFRESH_TOKEN_EXPIRY");
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service().validate_token("not.a.jwt").is_err());
    }
}
