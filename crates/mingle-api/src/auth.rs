use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use mingle_auth::TokenPair;
use mingle_types::api::{LoginRequest, MessageResponse, RegisterRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::session::{clear_session_cookies, session_cookies};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation(
            "username must be 3 to 32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".into()));
    }

    // bcrypt is deliberately slow; keep it off the async runtime.
    let db = state.clone();
    let created = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        if db.db.get_member_by_username(&req.username)?.is_some()
            || db.db.get_member_by_email(&req.email)?.is_some()
        {
            return Ok(false);
        }
        let hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;
        db.db.create_member(&req.username, &req.email, &hash)?;
        info!("registered member {}", req.username);
        Ok(true)
    })
    .await
    .map_err(|e| anyhow::anyhow!("blocking task failed: {}", e))??;

    if !created {
        return Err(ApiError::Conflict("user already exists".into()));
    }

    Ok((StatusCode::CREATED, Json(MessageResponse::new("success"))))
}

enum Lookup {
    Username(String),
    Email(String),
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let lookup = match (req.username, req.email) {
        (Some(u), _) if !u.is_empty() => Lookup::Username(u),
        (_, Some(e)) if !e.is_empty() => Lookup::Email(e),
        _ => {
            return Err(ApiError::Validation(
                "provide either username or email".into(),
            ));
        }
    };

    let password = req.password;
    let db = state.clone();
    let verified = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<String>> {
        let member = match &lookup {
            Lookup::Username(u) => db.db.get_member_by_username(u)?,
            Lookup::Email(e) => db.db.get_member_by_email(e)?,
        };
        let Some(member) = member else {
            return Ok(None);
        };
        if bcrypt::verify(&password, &member.password)? {
            Ok(Some(member.username))
        } else {
            Ok(None)
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("blocking task failed: {}", e))??;

    let username = verified.ok_or(ApiError::InvalidCredentials)?;

    let pair = TokenPair {
        access: state.tokens.issue_access(&username)?,
        refresh: state.tokens.issue_refresh(&username)?,
    };
    info!("login: {}", username);

    Ok((session_cookies(jar, &pair), Json(MessageResponse::new("success"))))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (clear_session_cookies(jar), Json(MessageResponse::new("success")))
}
