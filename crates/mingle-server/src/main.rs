mod config;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use mingle_api::google::GoogleOauth;
use mingle_api::{AppState, AppStateInner, auth, friends, google, session, users};
use mingle_auth::{SessionGate, TokenService};
use mingle_db::Database;
use mingle_graph::{GraphStore, RelationshipEngine};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mingle=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Fail fast: a server without its stores is useless.
    let db = Database::open(Path::new(&config.member_db_path))?;
    let graph = Arc::new(GraphStore::open(Path::new(&config.graph_db_path))?);

    let tokens = Arc::new(TokenService::new(
        &config.access_secret,
        &config.refresh_secret,
    ));

    let state: AppState = Arc::new(AppStateInner {
        db,
        engine: RelationshipEngine::new(graph.clone()),
        graph,
        gate: SessionGate::new(tokens.clone()),
        tokens,
        google: GoogleOauth::new(
            config.google_client_id,
            config.google_client_secret,
            config.google_redirect_url,
        ),
    });

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/google/login", get(google::login))
        .route("/google/callback", get(google::callback));

    let user_routes = Router::new()
        .route(
            "/",
            post(users::create_card)
                .get(users::get_card)
                .put(users::update_card),
        )
        .route("/friend", post(users::add_friend))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let friend_routes = Router::new()
        .route("/", get(friends::list).delete(friends::remove))
        .route("/pending", get(friends::pending))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    // Cookie auth needs credentialed CORS, which rules out wildcards.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/user", user_routes)
        .nest("/api/v1/friends", friend_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("mingle listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
