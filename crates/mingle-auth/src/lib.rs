pub mod gate;
pub mod tokens;

pub use gate::{SessionGate, SessionIdentity, TokenPair};
pub use tokens::{Claims, TokenError, TokenService, ACCESS_TTL, REFRESH_TTL};
