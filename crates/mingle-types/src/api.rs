use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login accepts either a username or an email; exactly one must be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

/// Generic `{"message": ...}` body used for plain success responses
/// and for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Profile cards --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCardRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Partial update: only the provided fields are merged onto the card.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image_url: Option<String>,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FriendRequestBody {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveFriendRequest {
    pub friend_username: String,
}

#[derive(Debug, Serialize)]
pub struct PendingFriendsResponse {
    pub pending_friends: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<String>,
}
