//! Authentication middleware for protected endpoints.
//!
//! Callers present `Authorization: Bearer <jwt>`. The token is HS256-signed
//! and carries `userId`, `role` and `exp`; a valid token becomes a
//! [`Principal`] in the request extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utm_core::{Principal, Role};

use super::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization required")]
    MissingToken,

    #[error("Invalid Authorization header format, expected `Bearer <token>`")]
    InvalidScheme,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Unknown role `{0}`")]
    UnknownRole(String),
}

/// Resolves request credentials to a caller identity.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// Token claims shared with the token minting tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub exp: u64,
}

pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn identify(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;
        let role = Role::parse(&claims.role).ok_or(AuthError::UnknownRole(claims.role))?;
        Ok(Principal::new(claims.user_id, role))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Middleware that requires an authenticated caller.
pub async fn require_principal(
    State(identity): State<Arc<dyn IdentityProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    match identity.identify(request.headers()) {
        Ok(principal) => {
            tracing::debug!(principal = %principal.id, role = principal.role.as_str(), "Authenticated request");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected unauthenticated request");
            ApiError::from(err).into_response()
        }
    }
}
