use std::sync::Arc;

use tracing::debug;

use crate::tokens::{TokenError, TokenService};

/// Freshly minted access + refresh tokens. Produced only by explicit
/// rotation; the caller decides where they go (cookies, headers, ...).
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Outcome of pure identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    /// The access token verified; nothing needs to change client-side.
    Active { username: String },
    /// Access token absent or invalid, but the refresh token verified.
    /// The caller should rotate the session before trusting it long-term.
    Stale { username: String },
    /// Neither token verified.
    Anonymous,
}

/// Per-request identity resolution, split into a pure check
/// (`authenticate`) and an explicit mutation (`rotate_session`) so callers
/// choose when a response grows new cookies.
#[derive(Clone)]
pub struct SessionGate {
    tokens: Arc<TokenService>,
}

impl SessionGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Resolve identity from whatever tokens the call carried. Pure: never
    /// issues anything. A verifying access token wins outright and the
    /// refresh token is not consulted at all.
    pub fn authenticate(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> SessionIdentity {
        if let Some(token) = access {
            match self.tokens.verify_access(token) {
                Ok(username) => return SessionIdentity::Active { username },
                Err(e) => debug!("access token rejected: {}", e),
            }
        }

        if let Some(token) = refresh {
            match self.tokens.verify_refresh(token) {
                Ok(username) => return SessionIdentity::Stale { username },
                Err(e) => debug!("refresh token rejected: {}", e),
            }
        }

        SessionIdentity::Anonymous
    }

    /// Mint a fresh access + refresh pair from a valid refresh token.
    /// The old refresh token stays cryptographically valid until its own
    /// expiry; there is no server-side revocation.
    pub fn rotate_session(&self, refresh: &str) -> Result<TokenPair, TokenError> {
        let username = self.tokens.verify_refresh(refresh)?;
        Ok(TokenPair {
            access: self.tokens.issue_access(&username)?,
            refresh: self.tokens.issue_refresh(&username)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> (SessionGate, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new("access-secret", "refresh-secret"));
        (SessionGate::new(tokens.clone()), tokens)
    }

    #[test]
    fn valid_access_wins_even_with_garbage_refresh() {
        let (gate, tokens) = gate();
        let access = tokens.issue_access("alice").unwrap();

        // A broken refresh token must not matter when access verifies.
        let identity = gate.authenticate(Some(&access), Some("garbage"));
        assert_eq!(
            identity,
            SessionIdentity::Active { username: "alice".into() }
        );
    }

    #[test]
    fn missing_access_with_valid_refresh_is_stale() {
        let (gate, tokens) = gate();
        let refresh = tokens.issue_refresh("alice").unwrap();

        assert_eq!(
            gate.authenticate(None, Some(&refresh)),
            SessionIdentity::Stale { username: "alice".into() }
        );
    }

    #[test]
    fn invalid_access_falls_back_to_refresh() {
        let (gate, tokens) = gate();
        let refresh = tokens.issue_refresh("alice").unwrap();

        assert_eq!(
            gate.authenticate(Some("garbage"), Some(&refresh)),
            SessionIdentity::Stale { username: "alice".into() }
        );
    }

    #[test]
    fn no_usable_token_is_anonymous() {
        let (gate, _) = gate();
        assert_eq!(gate.authenticate(None, None), SessionIdentity::Anonymous);
        assert_eq!(
            gate.authenticate(Some("bad"), Some("bad")),
            SessionIdentity::Anonymous
        );
    }

    #[test]
    fn rotation_yields_a_usable_pair() {
        let (gate, tokens) = gate();
        let refresh = tokens.issue_refresh("alice").unwrap();

        let pair = gate.rotate_session(&refresh).unwrap();
        assert_eq!(tokens.verify_access(&pair.access).unwrap(), "alice");
        assert_eq!(tokens.verify_refresh(&pair.refresh).unwrap(), "alice");
    }

    #[test]
    fn rotation_rejects_non_refresh_tokens() {
        let (gate, tokens) = gate();
        let access = tokens.issue_access("alice").unwrap();

        // An access token is not a refresh token, even for the same user.
        assert!(gate.rotate_session(&access).is_err());
        assert!(gate.rotate_session("garbage").is_err());
    }
}
