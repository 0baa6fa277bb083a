use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access tokens authorize a single request window.
pub const ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
/// Refresh tokens only authorize minting new access tokens.
pub const REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature or payload malformed")]
    MalformedSignature,
    #[error("required claim missing")]
    ClaimMissing,
    #[error("token encoding failed")]
    Encoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,
    pub user: String,
    pub exp: usize,
}

/// Decode target that tolerates missing fields so a structurally valid but
/// incomplete payload surfaces as `ClaimMissing` instead of a parse error.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    user: Option<String>,
    #[allow(dead_code)]
    exp: usize,
}

struct KeyPairing {
    enc: EncodingKey,
    dec: DecodingKey,
}

impl KeyPairing {
    fn from_secret(secret: &str) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret.as_bytes()),
            dec: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Stateless HS256 session tokens. Two keys: access and refresh tokens are
/// never interchangeable. Keys are immutable after construction, so the
/// service is safe to share across request tasks.
pub struct TokenService {
    access: KeyPairing,
    refresh: KeyPairing,
}

impl TokenService {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access: KeyPairing::from_secret(access_secret),
            refresh: KeyPairing::from_secret(refresh_secret),
        }
    }

    pub fn issue_access(&self, username: &str) -> Result<String, TokenError> {
        issue(username, &self.access.enc, ACCESS_TTL.as_secs() as i64)
    }

    pub fn issue_refresh(&self, username: &str) -> Result<String, TokenError> {
        issue(username, &self.refresh.enc, REFRESH_TTL.as_secs() as i64)
    }

    pub fn verify_access(&self, token: &str) -> Result<String, TokenError> {
        verify(token, &self.access.dec)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<String, TokenError> {
        verify(token, &self.refresh.dec)
    }
}

fn issue(username: &str, key: &EncodingKey, ttl_secs: i64) -> Result<String, TokenError> {
    let claims = Claims {
        authorized: true,
        user: username.to_string(),
        exp: (Utc::now().timestamp() + ttl_secs) as usize,
    };
    encode(&Header::default(), &claims, key).map_err(|_| TokenError::Encoding)
}

fn verify(token: &str, key: &DecodingKey) -> Result<String, TokenError> {
    // Zero leeway: the exp claim is the TTL boundary, exactly.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<RawClaims>(token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::MissingRequiredClaim(_) => TokenError::ClaimMissing,
        _ => TokenError::MalformedSignature,
    })?;

    match data.claims.user {
        Some(user) if !user.is_empty() => Ok(user),
        _ => Err(TokenError::ClaimMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("access-secret", "refresh-secret")
    }

    #[test]
    fn issue_and_verify_access() {
        let svc = service();
        let token = svc.issue_access("alice").unwrap();
        assert_eq!(svc.verify_access(&token).unwrap(), "alice");
    }

    #[test]
    fn access_and_refresh_keys_are_distinct() {
        let svc = service();
        let access = svc.issue_access("alice").unwrap();
        let refresh = svc.issue_refresh("alice").unwrap();

        assert_eq!(
            svc.verify_refresh(&access),
            Err(TokenError::MalformedSignature)
        );
        assert_eq!(
            svc.verify_access(&refresh),
            Err(TokenError::MalformedSignature)
        );
    }

    #[test]
    fn verify_respects_ttl_boundary() {
        let svc = service();

        // Still inside the TTL window: verification succeeds.
        let live = issue("alice", &svc.access.enc, 2).unwrap();
        assert_eq!(svc.verify_access(&live).unwrap(), "alice");

        // Past the TTL window (zero leeway): Expired, not Malformed.
        let dead = issue("alice", &svc.access.enc, -2).unwrap();
        assert_eq!(svc.verify_access(&dead), Err(TokenError::Expired));
    }

    #[test]
    fn missing_user_claim_is_rejected() {
        #[derive(serde::Serialize)]
        struct NoUser {
            authorized: bool,
            exp: usize,
        }
        let claims = NoUser {
            authorized: true,
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert_eq!(service().verify_access(&token), Err(TokenError::ClaimMissing));
    }

    #[test]
    fn garbage_token_is_malformed() {
        assert_eq!(
            service().verify_access("not-a-jwt"),
            Err(TokenError::MalformedSignature)
        );
    }
}
