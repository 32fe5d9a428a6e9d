use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::jwt::AuthUser, error::ApiResult, follows::service, state::AppState};

pub fn follow_routes() -> Router<AppState> {
    Router::new().route("/users/:id/follow", post(follow).delete(unfollow))
}

#[instrument(skip(state))]
pub async fn follow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service::follow(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn unfollow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service::unfollow(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
