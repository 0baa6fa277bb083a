//! The domain vocabulary of the social graph: node labels, relationship
//! names, and the typed property shapes decoded at the adapter boundary.

use serde::{Deserialize, Serialize};

pub mod labels {
    pub const USER: &str = "User";
    pub const CARD: &str = "Card";
    pub const FRIEND_REQUEST: &str = "FriendRequest";
}

pub mod rels {
    pub const HAS_CARD: &str = "HAS_CARD";
    pub const SENT_FRIEND_REQUEST: &str = "SENT_FRIEND_REQUEST";
    pub const TO_USER: &str = "TO_USER";
    pub const FRIENDS_WITH: &str = "FRIENDS_WITH";
}

pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProps {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardProps {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestProps {
    pub status: String,
    pub sender: String,
}

impl FriendRequestProps {
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}
