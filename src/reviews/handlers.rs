use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiResult,
    reviews::{
        dto::{CreateReviewRequest, ReviewResponse},
        service,
    },
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/tours/:id/reviews", get(list_tour_reviews))
        .route("/guides/:id/reviews", get(list_guide_reviews))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    let review = service::create_review(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(state))]
pub async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let reviews = service::list_for_tour(&state, id).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn list_guide_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let reviews = service::list_for_guide(&state, id).await?;
    Ok(Json(reviews))
}
