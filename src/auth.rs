//! Bearer-token boundary of the external session layer.
//!
//! Sign-in lives elsewhere; this crate only checks that a request carries a
//! token signed with the configured secret and whether its holder has
//! verified their email address.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub iat: usize,
    pub exp: usize,
}

/// The signed-in user, as seen by handlers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            email_verified: claims.email_verified,
        }
    }
}

pub fn issue_token(user: &CurrentUser, config: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expiration = now + chrono::Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        email_verified: user.email_verified,
        iat: now.timestamp().max(0) as usize,
        exp: expiration.timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
}

/// Attach the token holder, if any, to the request.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = match bearer_token(&req) {
        Some(token) => match verify_token(token, &state.config.auth) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                None
            }
        },
        None => None,
    };

    if let Some(claims) = claims {
        req.extensions_mut().insert(CurrentUser::from(claims));
    }

    next.run(req).await
}

/// Gate for routes that need a signed-in user with a verified email.
pub async fn require_verified(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<CurrentUser>() {
        None => Err(AppError::Unauthenticated),
        Some(user) if !user.email_verified => Err(AppError::Unverified),
        Some(_) => Ok(next.run(req).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: 1,
            name: "Test User".into(),
            email: "test@example.com".into(),
            email_verified: true,
        }
    }

    #[test]
    fn token_round_trip() {
        let config = AuthConfig::default();
        let token = issue_token(&user(), &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(CurrentUser::from(claims), user());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&user(), &AuthConfig::default()).unwrap();
        let other = AuthConfig {
            secret: "another-secret".into(),
            ..AuthConfig::default()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig {
            token_ttl_hours: -2,
            ..AuthConfig::default()
        };
        let token = issue_token(&user(), &config).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }
}
