use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::error::GraphError;
use crate::nodes::{FriendRequestProps, UserProps, labels, rels, STATUS_PENDING};
use crate::store::{GraphStore, GraphTx, Node, NodeId};

/// `ListPendingIncoming` never returns more than this many senders.
const PENDING_LIMIT: usize = 25;

/// Relationship state of an ordered user pair (A, B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairState {
    /// No request, no friendship.
    None,
    /// A pending friend request from `sender` exists.
    Requested { sender: String },
    /// Both directed FRIENDS_WITH edges exist.
    Friends,
}

/// The friend-request / friendship state machine. Every operation is one
/// graph transaction: the current state is read and the mutation decided
/// inside the same `write_tx`, so two concurrent requests from opposite
/// directions converge on a friendship instead of crossing mid-air.
#[derive(Clone)]
pub struct RelationshipEngine {
    store: Arc<GraphStore>,
}

impl RelationshipEngine {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Send (or implicitly accept) a friend request from `sender` to
    /// `recipient`. Idempotent: repeating the call never duplicates a
    /// pending request. Callers guarantee the two usernames differ.
    pub fn send_request(&self, sender: &str, recipient: &str) -> Result<PairState, GraphError> {
        self.store.write_tx(|tx| {
            let a = require_user(tx, sender)?;
            let b = require_user(tx, recipient)?;

            // Already friends: nothing to do, and definitely no new request.
            if tx.edge_exists(a, rels::FRIENDS_WITH, b)? {
                return Ok(PairState::Friends);
            }

            // The recipient had already asked first: this call is the
            // acceptance. Consume the request node (its edges cascade) and
            // create the friendship as a symmetric pair of edges.
            if let Some(reverse) = pending_request(tx, b, a)? {
                tx.delete_node(reverse.id)?;
                tx.create_edge(a, rels::FRIENDS_WITH, b)?;
                tx.create_edge(b, rels::FRIENDS_WITH, a)?;
                debug!("friendship established: {} <-> {}", sender, recipient);
                return Ok(PairState::Friends);
            }

            // Duplicate call from the same side: keep the single request.
            if pending_request(tx, a, b)?.is_some() {
                return Ok(PairState::Requested { sender: sender.to_string() });
            }

            let request = tx.create_node(
                labels::FRIEND_REQUEST,
                &json!({ "status": STATUS_PENDING, "sender": sender }),
            )?;
            tx.create_edge(a, rels::SENT_FRIEND_REQUEST, request)?;
            tx.create_edge(request, rels::TO_USER, b)?;
            debug!("friend request recorded: {} -> {}", sender, recipient);
            Ok(PairState::Requested { sender: sender.to_string() })
        })
    }

    /// Delete both FRIENDS_WITH edges between the pair. A no-op (not an
    /// error) when the pair was not friends, so retries are safe.
    pub fn remove_friend(&self, a: &str, b: &str) -> Result<PairState, GraphError> {
        self.store.write_tx(|tx| {
            let (Some(a), Some(b)) = (find_user(tx, a)?, find_user(tx, b)?) else {
                return Ok(PairState::None);
            };
            tx.delete_edge(a, rels::FRIENDS_WITH, b)?;
            tx.delete_edge(b, rels::FRIENDS_WITH, a)?;
            Ok(PairState::None)
        })
    }

    /// Distinct senders of pending requests targeting `username`, capped at
    /// 25. No ordering is promised.
    pub fn list_pending_incoming(&self, username: &str) -> Result<Vec<String>, GraphError> {
        self.store.read(|tx| {
            let Some(user) = find_user(tx, username)? else {
                return Ok(Vec::new());
            };

            let mut seen = HashSet::new();
            let mut senders = Vec::new();
            for node in tx.in_neighbors(user, rels::TO_USER)? {
                if node.label != labels::FRIEND_REQUEST {
                    continue;
                }
                let props: FriendRequestProps = node.decode()?;
                if props.is_pending() && seen.insert(props.sender.clone()) {
                    senders.push(props.sender);
                    if senders.len() == PENDING_LIMIT {
                        break;
                    }
                }
            }
            Ok(senders)
        })
    }

    /// Usernames on the other end of the user's outgoing FRIENDS_WITH edges.
    pub fn list_friends(&self, username: &str) -> Result<Vec<String>, GraphError> {
        self.store.read(|tx| {
            let Some(user) = find_user(tx, username)? else {
                return Ok(Vec::new());
            };
            tx.out_neighbors(user, rels::FRIENDS_WITH)?
                .iter()
                .map(|node| {
                    node.decode::<UserProps>()
                        .map(|props| props.username)
                        .map_err(GraphError::from)
                })
                .collect()
        })
    }

    /// Read-only probe of the pair's current state.
    pub fn pair_state(&self, a: &str, b: &str) -> Result<PairState, GraphError> {
        self.store.read(|tx| {
            let (Some(a_id), Some(b_id)) = (find_user(tx, a)?, find_user(tx, b)?) else {
                return Ok(PairState::None);
            };

            if tx.edge_exists(a_id, rels::FRIENDS_WITH, b_id)?
                && tx.edge_exists(b_id, rels::FRIENDS_WITH, a_id)?
            {
                return Ok(PairState::Friends);
            }
            if let Some(node) = pending_request(tx, a_id, b_id)? {
                let props: FriendRequestProps = node.decode()?;
                return Ok(PairState::Requested { sender: props.sender });
            }
            if let Some(node) = pending_request(tx, b_id, a_id)? {
                let props: FriendRequestProps = node.decode()?;
                return Ok(PairState::Requested { sender: props.sender });
            }
            Ok(PairState::None)
        })
    }
}

fn find_user(tx: &GraphTx, username: &str) -> Result<Option<NodeId>, GraphError> {
    Ok(tx
        .match_node(labels::USER, "username", username)?
        .map(|node| node.id))
}

fn require_user(tx: &GraphTx, username: &str) -> Result<NodeId, GraphError> {
    find_user(tx, username)?.ok_or(GraphError::NotFound)
}

/// The pending FriendRequest node sitting between `from` and `to`, if any.
fn pending_request(tx: &GraphTx, from: NodeId, to: NodeId) -> Result<Option<Node>, GraphError> {
    for node in tx.out_neighbors(from, rels::SENT_FRIEND_REQUEST)? {
        if node.label != labels::FRIEND_REQUEST {
            continue;
        }
        if !tx.edge_exists(node.id, rels::TO_USER, to)? {
            continue;
        }
        let props: FriendRequestProps = node.decode()?;
        if props.is_pending() {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::CardProps;

    fn engine_with_users(usernames: &[&str]) -> (RelationshipEngine, Arc<GraphStore>) {
        let store = Arc::new(GraphStore::open_in_memory().unwrap());
        for name in usernames {
            store
                .create_card(
                    name,
                    &CardProps {
                        first_name: name.to_string(),
                        last_name: "Test".into(),
                        profile_image_url: None,
                    },
                )
                .unwrap();
        }
        (RelationshipEngine::new(store.clone()), store)
    }

    fn friend_request_count(store: &GraphStore) -> usize {
        store
            .read(|tx| Ok(tx.nodes_with_label(labels::FRIEND_REQUEST)?.len()))
            .unwrap()
    }

    fn friendship_edge_count(store: &GraphStore, a: &str, b: &str) -> usize {
        store
            .read(|tx| {
                let a = tx.match_node(labels::USER, "username", a)?.unwrap().id;
                let b = tx.match_node(labels::USER, "username", b)?.unwrap().id;
                let forward = usize::from(tx.edge_exists(a, rels::FRIENDS_WITH, b)?);
                let backward = usize::from(tx.edge_exists(b, rels::FRIENDS_WITH, a)?);
                Ok(forward + backward)
            })
            .unwrap()
    }

    #[test]
    fn mutual_requests_converge_to_friendship() {
        let (engine, store) = engine_with_users(&["alice", "bob"]);

        assert_eq!(
            engine.send_request("alice", "bob").unwrap(),
            PairState::Requested { sender: "alice".into() }
        );
        assert_eq!(engine.send_request("bob", "alice").unwrap(), PairState::Friends);

        assert_eq!(engine.pair_state("alice", "bob").unwrap(), PairState::Friends);
        assert_eq!(friendship_edge_count(&store, "alice", "bob"), 2);
        assert_eq!(friend_request_count(&store), 0);
    }

    #[test]
    fn repeated_send_request_keeps_one_pending_node() {
        let (engine, store) = engine_with_users(&["alice", "bob"]);

        engine.send_request("alice", "bob").unwrap();
        let state = engine.send_request("alice", "bob").unwrap();

        assert_eq!(state, PairState::Requested { sender: "alice".into() });
        assert_eq!(friend_request_count(&store), 1);
    }

    #[test]
    fn remove_friend_is_idempotent() {
        let (engine, store) = engine_with_users(&["alice", "bob"]);
        engine.send_request("alice", "bob").unwrap();
        engine.send_request("bob", "alice").unwrap();

        assert_eq!(engine.remove_friend("alice", "bob").unwrap(), PairState::None);
        assert_eq!(engine.remove_friend("alice", "bob").unwrap(), PairState::None);

        assert_eq!(engine.pair_state("alice", "bob").unwrap(), PairState::None);
        assert_eq!(friendship_edge_count(&store, "alice", "bob"), 0);
    }

    #[test]
    fn remove_friend_on_strangers_is_a_noop() {
        let (engine, _) = engine_with_users(&["alice", "bob"]);
        assert_eq!(engine.remove_friend("alice", "bob").unwrap(), PairState::None);
        // Unknown users are a no-op too, not an error.
        assert_eq!(engine.remove_friend("alice", "nobody").unwrap(), PairState::None);
    }

    #[test]
    fn send_request_after_friendship_is_a_noop() {
        let (engine, store) = engine_with_users(&["alice", "bob"]);
        engine.send_request("alice", "bob").unwrap();
        engine.send_request("bob", "alice").unwrap();

        assert_eq!(engine.send_request("alice", "bob").unwrap(), PairState::Friends);
        assert_eq!(friend_request_count(&store), 0);
        assert_eq!(friendship_edge_count(&store, "alice", "bob"), 2);
    }

    #[test]
    fn send_request_to_unknown_user_fails() {
        let (engine, _) = engine_with_users(&["alice"]);
        assert!(matches!(
            engine.send_request("alice", "nobody"),
            Err(GraphError::NotFound)
        ));
    }

    #[test]
    fn pending_list_is_distinct_and_capped() {
        let names: Vec<String> = (0..30).map(|i| format!("user{:02}", i)).collect();
        let mut all: Vec<&str> = names.iter().map(String::as_str).collect();
        all.push("hub");
        let (engine, _) = engine_with_users(&all);

        for name in &names {
            engine.send_request(name, "hub").unwrap();
            // A duplicate send must not produce a duplicate sender entry.
            engine.send_request(name, "hub").unwrap();
        }

        let pending = engine.list_pending_incoming("hub").unwrap();
        assert_eq!(pending.len(), 25);
        let distinct: HashSet<&String> = pending.iter().collect();
        assert_eq!(distinct.len(), pending.len());
    }

    #[test]
    fn accepted_request_disappears_from_pending() {
        let (engine, _) = engine_with_users(&["alice", "bob"]);
        engine.send_request("alice", "bob").unwrap();
        assert_eq!(engine.list_pending_incoming("bob").unwrap(), vec!["alice"]);

        engine.send_request("bob", "alice").unwrap();
        assert!(engine.list_pending_incoming("bob").unwrap().is_empty());
    }

    #[test]
    fn friendship_lifecycle_end_to_end() {
        let (engine, store) = engine_with_users(&["alice", "bob"]);

        assert_eq!(
            engine.send_request("alice", "bob").unwrap(),
            PairState::Requested { sender: "alice".into() }
        );
        assert_eq!(
            engine.pair_state("alice", "bob").unwrap(),
            PairState::Requested { sender: "alice".into() }
        );

        assert_eq!(engine.send_request("bob", "alice").unwrap(), PairState::Friends);
        assert_eq!(friend_request_count(&store), 0);
        assert_eq!(friendship_edge_count(&store, "alice", "bob"), 2);
        assert_eq!(engine.list_friends("alice").unwrap(), vec!["bob"]);
        assert_eq!(engine.list_friends("bob").unwrap(), vec!["alice"]);

        assert_eq!(engine.remove_friend("alice", "bob").unwrap(), PairState::None);
        assert_eq!(engine.pair_state("alice", "bob").unwrap(), PairState::None);
        assert!(engine.list_friends("alice").unwrap().is_empty());
    }
}
