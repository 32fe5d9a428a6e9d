use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    follows::repo,
    notifications::{self, kind},
    state::AppState,
    users::repo::User,
};

pub async fn follow(state: &AppState, follower_id: Uuid, followee_id: Uuid) -> ApiResult<()> {
    if follower_id == followee_id {
        return Err(ApiError::InvalidInput("you cannot follow yourself".into()));
    }
    let follower = User::find_by_id(&state.db, follower_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let followee = User::find_by_id(&state.db, followee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let mut tx = state.db.begin().await?;
    if !repo::insert(&mut tx, follower.id, followee.id).await? {
        return Err(ApiError::Conflict("already following this user".into()));
    }
    repo::refresh_counts(&mut tx, follower.id, followee.id).await?;
    tx.commit().await?;

    notifications::notify(
        &state.db,
        followee.id,
        "New Follower",
        &format!("{} {}", follower.first_name, follower.last_name),
        kind::NEW_FOLLOWER,
        Some(follower.id),
    )
    .await;

    info!(follower = %follower.id, followee = %followee.id, "user followed");
    Ok(())
}

pub async fn unfollow(state: &AppState, follower_id: Uuid, followee_id: Uuid) -> ApiResult<()> {
    let mut tx = state.db.begin().await?;
    if !repo::delete(&mut tx, follower_id, followee_id).await? {
        return Err(ApiError::NotFound("not following this user".into()));
    }
    repo::refresh_counts(&mut tx, follower_id, followee_id).await?;
    tx.commit().await?;

    info!(follower = %follower_id, followee = %followee_id, "user unfollowed");
    Ok(())
}
