use tracing::info;
use uuid::Uuid;

use crate::{
    bookings::repo::{Booking, BookingStatus},
    error::{ApiError, ApiResult},
    reviews::{
        dto::{CreateReviewRequest, ReviewResponse},
        repo::Review,
    },
    state::AppState,
    tours::repo::Tour,
};

/// Creates a review for the caller's completed booking and refreshes the
/// tour's and guide's aggregates in the same transaction.
pub async fn create_review(
    state: &AppState,
    reviewer_id: Uuid,
    req: CreateReviewRequest,
) -> ApiResult<ReviewResponse> {
    if !(1..=5).contains(&req.tour_rating) || !(1..=5).contains(&req.guide_rating) {
        return Err(ApiError::InvalidInput("ratings must be between 1 and 5".into()));
    }

    let booking = Booking::find_by_id(&state.db, req.booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("booking not found".into()))?;
    if booking.user_id != reviewer_id {
        return Err(ApiError::Forbidden(
            "you can only review your own bookings".into(),
        ));
    }
    if booking.status != BookingStatus::Completed {
        return Err(ApiError::InvalidState(
            "you can only review completed bookings".into(),
        ));
    }
    if Review::exists_for_booking(&state.db, booking.id).await? {
        return Err(ApiError::Conflict(
            "you have already reviewed this booking".into(),
        ));
    }

    let tour = Tour::find_by_id(&state.db, booking.tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("tour not found".into()))?;

    let mut tx = state.db.begin().await?;
    let review = match Review::insert(
        &mut tx,
        booking.id,
        reviewer_id,
        tour.guide_id,
        tour.id,
        req.tour_rating,
        req.guide_rating,
        req.comment.as_deref(),
    )
    .await
    {
        Ok(r) => r,
        // unique booking_id: a concurrent review for the same booking won
        Err(e)
            if matches!(&e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")) =>
        {
            return Err(ApiError::Conflict(
                "you have already reviewed this booking".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };
    Review::recompute_tour_stats(&mut tx, tour.id).await?;
    Review::recompute_guide_stats(&mut tx, tour.guide_id).await?;
    tx.commit().await?;

    info!(review_id = %review.id, booking_id = %booking.id, "review created");
    Ok(ReviewResponse::from(review))
}

pub async fn list_for_tour(state: &AppState, tour_id: Uuid) -> ApiResult<Vec<ReviewResponse>> {
    let rows = Review::list_for_tour(&state.db, tour_id).await?;
    Ok(rows.into_iter().map(ReviewResponse::from).collect())
}

pub async fn list_for_guide(state: &AppState, guide_id: Uuid) -> ApiResult<Vec<ReviewResponse>> {
    let rows = Review::list_for_guide(&state.db, guide_id).await?;
    Ok(rows.into_iter().map(ReviewResponse::from).collect())
}
