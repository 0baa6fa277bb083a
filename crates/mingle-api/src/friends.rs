use axum::extract::State;
use axum::{Extension, Json};

use mingle_types::api::{
    FriendsResponse, MessageResponse, PendingFriendsResponse, RemoveFriendRequest,
};

use crate::AppState;
use crate::error::ApiError;
use crate::session::CurrentUser;

pub async fn pending(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<PendingFriendsResponse>, ApiError> {
    let pending_friends = state.engine.list_pending_incoming(&user.0)?;
    Ok(Json(PendingFriendsResponse { pending_friends }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<FriendsResponse>, ApiError> {
    let friends = state.engine.list_friends(&user.0)?;
    Ok(Json(FriendsResponse { friends }))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RemoveFriendRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.friend_username.is_empty() {
        return Err(ApiError::Validation("friend_username is required".into()));
    }

    // Idempotent: removing an absent friendship is still a success.
    state.engine.remove_friend(&user.0, &req.friend_username)?;

    Ok(Json(MessageResponse::new("friend removed")))
}
