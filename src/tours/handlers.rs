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
    state::AppState,
    tours::{
        dto::{CreateTourRequest, TourResponse},
        service,
    },
};

pub fn tour_routes() -> Router<AppState> {
    Router::new()
        .route("/tours", post(create_tour))
        .route("/tours/:id", get(get_tour).put(update_tour).delete(delete_tour))
        .route("/users/:id/tours", get(list_guide_tours))
}

#[instrument(skip(state, payload))]
pub async fn create_tour(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTourRequest>,
) -> ApiResult<(StatusCode, Json<TourResponse>)> {
    let tour = service::create_tour(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(tour)))
}

#[instrument(skip(state))]
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TourResponse>> {
    let tour = service::get_tour(&state, id).await?;
    Ok(Json(tour))
}

#[instrument(skip(state, payload))]
pub async fn update_tour(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateTourRequest>,
) -> ApiResult<Json<TourResponse>> {
    let tour = service::update_tour(&state, user_id, id, payload).await?;
    Ok(Json(tour))
}

#[instrument(skip(state))]
pub async fn delete_tour(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service::delete_tour(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_guide_tours(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TourResponse>>> {
    let tours = service::list_by_guide(&state, id).await?;
    Ok(Json(tours))
}
