//! Google sign-in: redirect dance plus first-login auto-registration.
//! Only the pieces the session core needs — the provider's wire schema is
//! reduced to "exchange a code, read an email".

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Deserialize;
use tracing::info;

use mingle_auth::TokenPair;
use mingle_types::api::MessageResponse;

use crate::AppState;
use crate::error::ApiError;
use crate::session::session_cookies;

const STATE_COOKIE: &str = "oauthstate";

pub struct GoogleOauth {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    http: reqwest::Client,
}

impl GoogleOauth {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".into(),
            http: reqwest::Client::new(),
        }
    }

    fn authorize_url(&self, state: &str) -> anyhow::Result<String> {
        let url = reqwest::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "https://www.googleapis.com/auth/userinfo.email"),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let resp: TokenResponse = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.access_token)
    }

    async fn fetch_email(&self, access_token: &str) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct UserInfo {
            email: String,
        }

        let info: UserInfo = self
            .http
            .get(&self.userinfo_url)
            .query(&[("access_token", access_token)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(info.email)
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let nonce = random_token(16);
    let url = state.google.authorize_url(&nonce)?;

    let mut cookie = Cookie::new(STATE_COOKIE, nonce);
    cookie.set_http_only(true);
    cookie.set_path("/");

    Ok((jar.add(cookie), Redirect::temporary(&url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub state: String,
    pub code: String,
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let expected = jar
        .get(STATE_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or_else(|| ApiError::Validation("missing oauth state cookie".into()))?;
    if query.state != expected {
        return Err(ApiError::Validation("oauth state mismatch".into()));
    }

    let token = state.google.exchange_code(&query.code).await?;
    let email = state.google.fetch_email(&token).await?;
    let username = email.split('@').next().unwrap_or(email.as_str()).to_string();

    // First sign-in registers the member. The stored password is random
    // filler: these accounts only ever authenticate through Google.
    let db = state.clone();
    let uname = username.clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        if db.db.get_member_by_username(&uname)?.is_none() {
            let hash = bcrypt::hash(random_token(32), bcrypt::DEFAULT_COST)?;
            db.db.create_member(&uname, &email, &hash)?;
            info!("registered member {} via google", uname);
        }
        Ok(())
    })
    .await
    .map_err(|e| anyhow::anyhow!("blocking task failed: {}", e))??;

    let pair = TokenPair {
        access: state.tokens.issue_access(&username)?,
        refresh: state.tokens.issue_refresh(&username)?,
    };

    let mut used_state = Cookie::new(STATE_COOKIE, "");
    used_state.set_path("/");
    let jar = jar.remove(used_state);

    Ok((session_cookies(jar, &pair), Json(MessageResponse::new("success"))))
}

fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
