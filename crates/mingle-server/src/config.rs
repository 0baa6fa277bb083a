use std::env;

use anyhow::Result;

/// Process configuration, read once from the environment at startup and
/// handed to constructors from `main`.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub member_db_path: String,
    pub graph_db_path: String,
    pub access_secret: String,
    pub refresh_secret: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env_or("MINGLE_HOST", "0.0.0.0"),
            port: env_or("MINGLE_PORT", "8080").parse()?,
            member_db_path: env_or("MINGLE_MEMBER_DB", "mingle-members.db"),
            graph_db_path: env_or("MINGLE_GRAPH_DB", "mingle-graph.db"),
            access_secret: env_or("MINGLE_JWT_SECRET", "dev-secret-change-me"),
            refresh_secret: env_or("MINGLE_JWT_REFRESH_SECRET", "dev-refresh-change-me"),
            google_client_id: env_or("MINGLE_GOOGLE_CLIENT_ID", ""),
            google_client_secret: env_or("MINGLE_GOOGLE_CLIENT_SECRET", ""),
            google_redirect_url: env_or(
                "MINGLE_GOOGLE_REDIRECT_URL",
                "http://localhost:8080/api/v1/auth/google/callback",
            ),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}
