//! Profile-card operations. A User node owns exactly one Card via
//! `HAS_CARD`; the card never exists without its user, and neither is ever
//! deleted here.

use serde_json::json;
use tracing::debug;

use crate::error::GraphError;
use crate::nodes::{CardProps, UserProps, labels, rels};
use crate::store::GraphStore;

impl GraphStore {
    /// Create the User node and its Card in one transaction. Fails with
    /// `AlreadyExists` if the user already published a card.
    pub fn create_card(&self, username: &str, card: &CardProps) -> Result<(), GraphError> {
        self.write_tx(|tx| {
            if tx.match_node(labels::USER, "username", username)?.is_some() {
                return Err(GraphError::AlreadyExists);
            }

            let user = tx.create_node(labels::USER, &json!({ "username": username }))?;
            let card_node = tx.create_node(
                labels::CARD,
                &json!({
                    "first_name": card.first_name,
                    "last_name": card.last_name,
                    "profile_image_url": card.profile_image_url,
                }),
            )?;
            tx.create_edge(user, rels::HAS_CARD, card_node)?;
            debug!("card created for {}", username);
            Ok(())
        })
    }

    pub fn get_card(&self, username: &str) -> Result<(UserProps, CardProps), GraphError> {
        self.read(|tx| {
            let user = tx
                .match_node(labels::USER, "username", username)?
                .ok_or(GraphError::NotFound)?;
            let card = tx
                .out_neighbors(user.id, rels::HAS_CARD)?
                .into_iter()
                .next()
                .ok_or(GraphError::NotFound)?;
            Ok((user.decode()?, card.decode()?))
        })
    }

    /// Merge the given JSON object onto the card's properties; fields not
    /// present in the patch are left untouched.
    pub fn update_card(&self, username: &str, patch: &serde_json::Value) -> Result<(), GraphError> {
        self.write_tx(|tx| {
            let user = tx
                .match_node(labels::USER, "username", username)?
                .ok_or(GraphError::NotFound)?;
            let card = tx
                .out_neighbors(user.id, rels::HAS_CARD)?
                .into_iter()
                .next()
                .ok_or(GraphError::NotFound)?;
            tx.merge_props(card.id, patch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(first: &str, last: &str) -> CardProps {
        CardProps {
            first_name: first.into(),
            last_name: last.into(),
            profile_image_url: None,
        }
    }

    #[test]
    fn create_then_get() {
        let store = GraphStore::open_in_memory().unwrap();
        store.create_card("alice", &card("Ada", "Lovelace")).unwrap();

        let (user, fetched) = store.get_card("alice").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(fetched, card("Ada", "Lovelace"));
    }

    #[test]
    fn second_card_for_same_user_is_rejected() {
        let store = GraphStore::open_in_memory().unwrap();
        store.create_card("alice", &card("Ada", "Lovelace")).unwrap();

        assert!(matches!(
            store.create_card("alice", &card("A", "L")),
            Err(GraphError::AlreadyExists)
        ));
    }

    #[test]
    fn get_unknown_card_is_not_found() {
        let store = GraphStore::open_in_memory().unwrap();
        assert!(matches!(store.get_card("alice"), Err(GraphError::NotFound)));
    }

    #[test]
    fn update_merges_only_given_fields() {
        let store = GraphStore::open_in_memory().unwrap();
        store.create_card("alice", &card("Ada", "Lovelace")).unwrap();

        store
            .update_card(
                "alice",
                &serde_json::json!({"profile_image_url": "https://img.example/a.png"}),
            )
            .unwrap();

        let (_, fetched) = store.get_card("alice").unwrap();
        assert_eq!(fetched.first_name, "Ada");
        assert_eq!(fetched.last_name, "Lovelace");
        assert_eq!(
            fetched.profile_image_url.as_deref(),
            Some("https://img.example/a.png")
        );

        assert!(matches!(
            store.update_card("nobody", &serde_json::json!({"first_name": "X"})),
            Err(GraphError::NotFound)
        ));
    }
}
