//! Bearer-credential resolution.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Access and refresh
//! tokens are signed with separate secrets. Identity is resolved per request
//! through actix extractors and passed explicitly into the services.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::errors::WorkflowError;
use crate::domain::order::{Identity, Role};
use crate::errors::AppError;

const ACCESS_TOKEN_TTL_HOURS: i64 = 2;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
/// Tolerated clock skew between token issuer and verifier.
const CLOCK_LEEWAY_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secrets(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    pub fn issue_pair(&self, user_id: i32, role: Role) -> Result<TokenPair, WorkflowError> {
        Ok(TokenPair {
            access_token: self.sign(
                user_id,
                role,
                Duration::hours(ACCESS_TOKEN_TTL_HOURS),
                &self.access_encoding,
            )?,
            refresh_token: self.sign(
                user_id,
                role,
                Duration::days(REFRESH_TOKEN_TTL_DAYS),
                &self.refresh_encoding,
            )?,
        })
    }

    fn sign(
        &self,
        user_id: i32,
        role: Role,
        ttl: Duration,
        key: &EncodingKey,
    ) -> Result<String, WorkflowError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, key)
            .map_err(|e| WorkflowError::StoreUnavailable(format!("token signing failed: {e}")))
    }

    pub fn verify_access(&self, token: &str) -> Result<Identity, WorkflowError> {
        verify(token, &self.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Identity, WorkflowError> {
        verify(token, &self.refresh_decoding)
    }
}

fn verify(token: &str, key: &DecodingKey) -> Result<Identity, WorkflowError> {
    let mut validation = Validation::default();
    validation.leeway = CLOCK_LEEWAY_SECS;
    let data =
        decode::<Claims>(token, key, &validation).map_err(|_| WorkflowError::Unauthenticated)?;
    let id: i32 = data
        .claims
        .sub
        .parse()
        .map_err(|_| WorkflowError::Unauthenticated)?;
    let role = Role::parse(&data.claims.role).ok_or(WorkflowError::Unauthenticated)?;
    Ok(Identity::User { id, role })
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn resolve(req: &HttpRequest) -> Result<Identity, AppError> {
    let keys = req
        .app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| AppError::Internal("JwtKeys not configured".to_string()))?;
    match bearer_token(req) {
        Some(token) => Ok(keys.verify_access(token)?),
        None => Ok(Identity::Anonymous),
    }
}

/// Extractor for routes that require a signed-in caller.
pub struct AuthedUser(pub Identity);

impl FromRequest for AuthedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve(req).and_then(|identity| match identity {
            Identity::Anonymous => Err(WorkflowError::Unauthenticated.into()),
            user => Ok(AuthedUser(user)),
        }))
    }
}

/// Extractor for routes where authentication is optional (guest checkout).
/// An invalid or expired token is still rejected; only an absent one
/// resolves to `Anonymous`.
pub struct MaybeUser(pub Identity);

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve(req).map(MaybeUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::from_secrets("access-secret-for-tests", "refresh-secret-for-tests")
    }

    #[test]
    fn access_token_roundtrip_preserves_id_and_role() {
        let keys = keys();
        let pair = keys.issue_pair(42, Role::Staff).unwrap();
        let identity = keys.verify_access(&pair.access_token).unwrap();
        assert_eq!(
            identity,
            Identity::User {
                id: 42,
                role: Role::Staff
            }
        );
    }

    #[test]
    fn refresh_token_is_not_a_valid_access_token() {
        let keys = keys();
        let pair = keys.issue_pair(42, Role::Customer).unwrap();
        assert_eq!(
            keys.verify_access(&pair.refresh_token).unwrap_err(),
            WorkflowError::Unauthenticated
        );
    }

    #[test]
    fn refresh_token_verifies_against_refresh_secret() {
        let keys = keys();
        let pair = keys.issue_pair(7, Role::Admin).unwrap();
        let identity = keys.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(
            identity,
            Identity::User {
                id: 7,
                role: Role::Admin
            }
        );
    }

    #[test]
    fn garbage_token_is_unauthenticated() {
        assert_eq!(
            keys().verify_access("not-a-jwt").unwrap_err(),
            WorkflowError::Unauthenticated
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtKeys::from_secrets("different-secret", "different-refresh");
        let pair = other.issue_pair(1, Role::Admin).unwrap();
        assert_eq!(
            keys().verify_access(&pair.access_token).unwrap_err(),
            WorkflowError::Unauthenticated
        );
    }
}
