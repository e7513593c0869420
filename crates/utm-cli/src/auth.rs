//! Operator token minting.
//!
//! Tokens are HS256-signed with the server's `UTM_JWT_SECRET` and carry
//! `userId`, `role` and `exp`.

use anyhow::{Context, Result};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use utm_core::Role;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "userId")]
    user_id: String,
    role: String,
    /// Expiration time (Unix timestamp)
    exp: u64,
}

/// Configuration for token generation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub user_id: String,
    pub role: Role,
    /// Shared signing secret
    pub secret: String,
    /// Token validity in hours
    pub expiry_hours: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            user_id: "utm-admin".to_string(),
            role: Role::UtmAdmin,
            secret: "utm-dev-secret-change-me".to_string(),
            expiry_hours: 24,
        }
    }
}

/// Generate a signed bearer token for the UTM server.
///
/// # Example
/// ```
/// use utm_cli::auth::{generate_operator_token, TokenConfig};
///
/// let token = generate_operator_token(&TokenConfig::default()).unwrap();
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn generate_operator_token(config: &TokenConfig) -> Result<String> {
    let exp = chrono::Utc::now().timestamp().max(0) as u64 + config.expiry_hours * 3600;

    let claims = Claims {
        user_id: config.user_id.clone(),
        role: config.role.as_str().to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}
