pub mod auth;
pub mod error;
pub mod friends;
pub mod google;
pub mod session;
pub mod users;

use std::sync::Arc;

use mingle_auth::{SessionGate, TokenService};
use mingle_db::Database;
use mingle_graph::{GraphStore, RelationshipEngine};

use crate::google::GoogleOauth;

pub type AppState = Arc<AppStateInner>;

/// Everything a request handler needs, constructed once at startup and
/// injected here — no process-wide singletons.
pub struct AppStateInner {
    pub db: Database,
    pub graph: Arc<GraphStore>,
    pub engine: RelationshipEngine,
    pub tokens: Arc<TokenService>,
    pub gate: SessionGate,
    pub google: GoogleOauth,
}
