//! Cookie-based session resolution for protected routes.
//!
//! The gate's `authenticate` is pure; only the rotation branch here touches
//! the outgoing response, by attaching a fresh cookie pair.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use mingle_auth::{SessionIdentity, TokenPair};

use crate::AppState;
use crate::error::ApiError;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Authenticated username, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let access = jar.get(ACCESS_COOKIE).map(|c| c.value().to_owned());
    let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned());

    match state.gate.authenticate(access.as_deref(), refresh.as_deref()) {
        SessionIdentity::Active { username } => {
            req.extensions_mut().insert(CurrentUser(username));
            Ok(next.run(req).await)
        }
        SessionIdentity::Stale { username } => {
            // Silent rotation: the refresh token vouched for the user, so
            // reissue both tokens and hand them back with the response.
            let Some(refresh) = refresh else {
                return Err(ApiError::Unauthenticated);
            };
            let pair = state.gate.rotate_session(&refresh)?;
            req.extensions_mut().insert(CurrentUser(username));
            let response = next.run(req).await;
            Ok((session_cookies(jar, &pair), response).into_response())
        }
        SessionIdentity::Anonymous => Err(ApiError::Unauthenticated),
    }
}

/// Attach both session cookies to the jar.
pub fn session_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access.clone()))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh.clone()))
}

/// Expire both session cookies. The tokens themselves stay valid until
/// their exp claim passes; there is no server-side revocation.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(scoped(ACCESS_COOKIE)).remove(scoped(REFRESH_COOKIE))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie
}

// Removal cookies must carry the same path as the originals.
fn scoped(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}
