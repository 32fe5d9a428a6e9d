use crate::state::AppState;
use axum::Router;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

pub mod handlers;
pub mod repo;

pub mod kind {
    pub const NEW_BOOKING: &str = "NEW_BOOKING";
    pub const BOOKING_CANCELLED_TRAVELER: &str = "BOOKING_CANCELLED_TRAVELER";
    pub const BOOKING_CANCELLED_GUIDE: &str = "BOOKING_CANCELLED_GUIDE";
    pub const TOUR_CANCELLED: &str = "TOUR_CANCELLED";
    pub const NEW_TOUR: &str = "NEW_TOUR";
    pub const NEW_FOLLOWER: &str = "NEW_FOLLOWER";
}

pub fn router() -> Router<AppState> {
    handlers::notification_routes()
}

/// Fire-and-forget write. A failed notification must never abort or roll back
/// the operation that triggered it, so the error is only logged.
pub async fn notify(
    db: &PgPool,
    user_id: Uuid,
    title: &str,
    message: &str,
    kind: &str,
    related_id: Option<Uuid>,
) {
    if let Err(e) = repo::Notification::insert(db, user_id, title, message, kind, related_id).await
    {
        error!(error = %e, %user_id, kind, "failed to write notification");
    }
}
