//! JWT token generation and validation.

use crate::{config::AppConfig, error::AppError, models::user::User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    /// Email, used by the ownership filter for the "user" role
    pub email: String,

    /// Role tag (admin, it_staff, user)
    pub role: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // HS256 requires at least 32 bytes of key material
        if secret.len() < 32 {
            return Err(AppError::Config(
                "JWT secret too short (min 32 chars)".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
        })
    }

    pub fn access_token_exp_secs(&self) -> u64 {
        self.access_token_exp_secs
    }

    /// Generate an access token for an authenticated user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_exp_secs as i64);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Validate an access token and return its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::Unauthorized
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService {
            encoding_key: EncodingKey::from_secret(b"test-secret-key-of-at-least-32-bytes!!"),
            decoding_key: DecodingKey::from_secret(b"test-secret-key-of-at-least-32-bytes!!"),
            access_token_exp_secs: 900,
        }
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ivanov".to_string(),
            email: "ivanov@example.com".to_string(),
            name: "Иван Иванов".to_string(),
            department: "Бухгалтерия".to_string(),
            role: "user".to_string(),
            telegram_username: None,
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let service = test_service();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "ivanov");
        assert_eq!(claims.email, "ivanov@example.com");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        assert!(service.validate_access_token("not-a-token").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = test_service();
        let other = JwtService {
            encoding_key: EncodingKey::from_secret(b"another-secret-key-of-at-least-32-bytes"),
            decoding_key: DecodingKey::from_secret(b"another-secret-key-of-at-least-32-bytes"),
            access_token_exp_secs: 900,
        };

        let token = other.generate_access_token(&test_user()).unwrap();
        assert!(service.validate_access_token(&token).is_err());
    }
}
