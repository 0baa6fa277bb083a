pub mod cards;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod nodes;
pub mod store;

pub use engine::{PairState, RelationshipEngine};
pub use error::{DecodeError, GraphError};
pub use store::{GraphStore, GraphTx, Node, NodeId};
