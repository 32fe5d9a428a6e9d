use tracing::info;
use uuid::Uuid;

use crate::{
    bookings::{
        dto::{BookTourRequest, BookingResponse},
        repo::{Booking, BookingStatus},
        schedule::{has_ended, overlaps, tour_window},
    },
    error::{ApiError, ApiResult},
    notifications::{self, kind},
    state::AppState,
    tours::repo::{Tour, TourStatus},
    users::repo::{Role, User},
};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Reserves seats on a tour. All checks and both mutations (seat decrement,
/// booking insert) run in one transaction that holds the tour row lock, so
/// two concurrent calls cannot both pass the capacity check.
pub async fn book_tour(
    state: &AppState,
    traveler_id: Uuid,
    req: BookTourRequest,
) -> ApiResult<BookingResponse> {
    if req.number_of_participants < 1 {
        return Err(ApiError::InvalidInput(
            "number of participants must be at least 1".into(),
        ));
    }

    let user = User::find_by_id(&state.db, traveler_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    if user.role != Role::Traveler {
        return Err(ApiError::Forbidden("only travelers can book tours".into()));
    }

    let mut tx = state.db.begin().await?;

    if Booking::exists_confirmed(&mut tx, user.id, req.tour_id).await? {
        return Err(ApiError::Conflict("you have already booked this tour".into()));
    }

    let tour = Tour::find_for_update(&mut tx, req.tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("tour not found".into()))?;
    if tour.status != TourStatus::Active {
        return Err(ApiError::InvalidState(
            "tour is not available for booking".into(),
        ));
    }
    let (date, start_time) = match (tour.scheduled_date, tour.start_time) {
        (Some(d), Some(t)) => (d, t),
        _ => {
            return Err(ApiError::InvalidState(
                "tour does not have a scheduled date or time".into(),
            ))
        }
    };

    // Reject a booking whose tour would overlap another one the traveler
    // already holds.
    let window = tour_window(date, start_time, &tour.duration);
    let others = Booking::confirmed_schedules_for_user(&mut tx, user.id).await?;
    for other in &others {
        if other.tour_id == tour.id {
            continue;
        }
        let (d, t) = match (other.scheduled_date, other.start_time) {
            (Some(d), Some(t)) => (d, t),
            _ => continue,
        };
        if overlaps(&window, &tour_window(d, t, &other.duration)) {
            return Err(ApiError::Conflict(format!(
                "this tour overlaps with your existing booking: '{}'",
                other.tour_title
            )));
        }
    }

    if tour.available_spots <= 0 {
        return Err(ApiError::InvalidState(
            "no available spots for this tour".into(),
        ));
    }
    if req.number_of_participants > tour.available_spots {
        return Err(ApiError::InvalidInput(format!(
            "requested participants ({}) exceed available spots ({})",
            req.number_of_participants, tour.available_spots
        )));
    }

    Tour::take_spots(&mut tx, tour.id, req.number_of_participants).await?;
    let booking = match Booking::insert(&mut tx, user.id, tour.id, req.number_of_participants).await
    {
        Ok(b) => b,
        // partial unique index: a concurrent booking for the same pair won
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict("you have already booked this tour".into()))
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;

    notifications::notify(
        &state.db,
        tour.guide_id,
        "New Booking",
        &format!(
            "{} {}|{}|{}",
            user.first_name, user.last_name, req.number_of_participants, tour.title
        ),
        kind::NEW_BOOKING,
        Some(tour.id),
    )
    .await;

    info!(booking_id = %booking.id, tour_id = %tour.id, user_id = %user.id,
          participants = req.number_of_participants, "tour booked");
    Ok(BookingResponse::from_parts(booking, &tour, &user))
}

/// Cancels a confirmed booking and returns its seats to the pool, both in the
/// same transaction.
pub async fn cancel_booking(state: &AppState, user_id: Uuid, booking_id: Uuid) -> ApiResult<()> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let mut tx = state.db.begin().await?;

    let booking = Booking::find_for_update(&mut tx, booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("booking not found".into()))?;
    if booking.user_id != user.id {
        return Err(ApiError::Forbidden(
            "you can only cancel your own bookings".into(),
        ));
    }
    match booking.status {
        BookingStatus::Cancelled => {
            return Err(ApiError::InvalidState("booking is already cancelled".into()))
        }
        BookingStatus::Completed => {
            return Err(ApiError::InvalidState("booking is already completed".into()))
        }
        BookingStatus::Confirmed => {}
    }

    let tour = Tour::find_for_update(&mut tx, booking.tour_id)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "booking {} references missing tour {}",
                booking.id,
                booking.tour_id
            ))
        })?;

    Tour::release_spots(&mut tx, tour.id, booking.number_of_participants).await?;
    Booking::set_status(&mut tx, booking.id, BookingStatus::Cancelled).await?;
    tx.commit().await?;

    notifications::notify(
        &state.db,
        user.id,
        "Booking Cancelled",
        &tour.title,
        kind::BOOKING_CANCELLED_TRAVELER,
        Some(tour.id),
    )
    .await;
    notifications::notify(
        &state.db,
        tour.guide_id,
        "Booking Cancelled",
        &format!("{} {}|{}", user.first_name, user.last_name, tour.title),
        kind::BOOKING_CANCELLED_GUIDE,
        Some(tour.id),
    )
    .await;

    info!(booking_id = %booking.id, user_id = %user.id, "booking cancelled");
    Ok(())
}

/// Promotes confirmed bookings whose tour has already ended. Each UPDATE is
/// predicated on the row still being CONFIRMED, so rerunning the sweep or
/// racing a cancellation changes nothing.
pub async fn complete_past_bookings(state: &AppState) -> anyhow::Result<u64> {
    let candidates = Booking::confirmed_schedules(&state.db).await?;
    let now = state.clock.now();

    let mut completed = 0u64;
    for candidate in candidates {
        let (date, start_time) = match (candidate.scheduled_date, candidate.start_time) {
            (Some(d), Some(t)) => (d, t),
            _ => continue,
        };
        let window = tour_window(date, start_time, &candidate.duration);
        if has_ended(&window, now) {
            completed += Booking::complete_if_confirmed(&state.db, candidate.booking_id).await?;
        }
    }

    if completed > 0 {
        info!(completed, "completed past bookings");
    }
    Ok(completed)
}

pub async fn list_my_bookings(state: &AppState, user_id: Uuid) -> ApiResult<Vec<BookingResponse>> {
    let rows = Booking::list_for_user(&state.db, user_id).await?;
    Ok(rows.into_iter().map(BookingResponse::from).collect())
}

/// Bookings across every tour the caller guides.
pub async fn list_guide_bookings(
    state: &AppState,
    guide_id: Uuid,
) -> ApiResult<Vec<BookingResponse>> {
    let guide = User::find_by_id(&state.db, guide_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    if guide.role != Role::Guide {
        return Err(ApiError::Forbidden(
            "only guides can list tour bookings".into(),
        ));
    }
    let rows = Booking::list_for_guide(&state.db, guide.id).await?;
    Ok(rows.into_iter().map(BookingResponse::from).collect())
}
