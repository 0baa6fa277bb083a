use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use mingle_graph::PairState;
use mingle_graph::nodes::CardProps;
use mingle_types::api::{
    CardResponse, CreateCardRequest, FriendRequestBody, MessageResponse, UpdateCardRequest,
};

use crate::AppState;
use crate::error::ApiError;
use crate::session::CurrentUser;

pub async fn create_card(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.first_name.is_empty() || req.last_name.is_empty() {
        return Err(ApiError::Validation(
            "first_name and last_name are required".into(),
        ));
    }

    let card = CardProps {
        first_name: req.first_name,
        last_name: req.last_name,
        profile_image_url: req.profile_image_url,
    };
    state.graph.create_card(&user.0, &card)?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("card created"))))
}

#[derive(Debug, Deserialize)]
pub struct CardQuery {
    #[serde(default)]
    pub username: Option<String>,
}

/// Fetch a card: your own by default, anyone's by `?username=`.
pub async fn get_card(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CardQuery>,
) -> Result<Json<CardResponse>, ApiError> {
    let username = query
        .username
        .filter(|u| !u.is_empty())
        .unwrap_or(user.0);

    let (user_props, card) = state.graph.get_card(&username)?;

    Ok(Json(CardResponse {
        username: user_props.username,
        first_name: card.first_name,
        last_name: card.last_name,
        profile_image_url: card.profile_image_url,
    }))
}

pub async fn update_card(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut patch = serde_json::Map::new();
    if let Some(v) = req.first_name {
        patch.insert("first_name".into(), v.into());
    }
    if let Some(v) = req.last_name {
        patch.insert("last_name".into(), v.into());
    }
    if let Some(v) = req.profile_image_url {
        patch.insert("profile_image_url".into(), v.into());
    }
    if patch.is_empty() {
        return Err(ApiError::Validation("no card fields to update".into()));
    }

    state
        .graph
        .update_card(&user.0, &serde_json::Value::Object(patch))?;

    Ok(Json(MessageResponse::new("card updated")))
}

pub async fn add_friend(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FriendRequestBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    if req.username == user.0 {
        return Err(ApiError::Validation("cannot befriend yourself".into()));
    }

    let message = match state.engine.send_request(&user.0, &req.username)? {
        PairState::Friends => "friend request accepted",
        PairState::Requested { .. } => "friend request sent",
        PairState::None => "no change",
    };

    Ok(Json(MessageResponse::new(message)))
}
