use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod schedule;
pub mod service;

pub fn router() -> Router<AppState> {
    handlers::booking_routes()
}
