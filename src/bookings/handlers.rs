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
    bookings::{
        dto::{BookTourRequest, BookingResponse},
        service,
    },
    error::ApiResult,
    state::AppState,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(book_tour).get(list_my_bookings))
        .route("/bookings/guide", get(list_guide_bookings))
        .route("/bookings/:id/cancel", post(cancel_booking))
}

#[instrument(skip(state, payload))]
pub async fn book_tour(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<BookTourRequest>,
) -> ApiResult<(StatusCode, Json<BookingResponse>)> {
    let booking = service::book_tour(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state))]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = service::list_my_bookings(&state, user_id).await?;
    Ok(Json(bookings))
}

#[instrument(skip(state))]
pub async fn list_guide_bookings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = service::list_guide_bookings(&state, user_id).await?;
    Ok(Json(bookings))
}

#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service::cancel_booking(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
