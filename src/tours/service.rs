use uuid::Uuid;

use crate::{
    bookings::repo::Booking,
    error::{ApiError, ApiResult},
    follows,
    notifications::{self, kind},
    state::AppState,
    tours::{
        dto::{CreateTourRequest, TourResponse},
        repo::{Tour, TourStatus},
    },
    users::repo::{Role, User},
};

pub async fn create_tour(
    state: &AppState,
    guide_id: Uuid,
    req: CreateTourRequest,
) -> ApiResult<TourResponse> {
    let guide = User::find_by_id(&state.db, guide_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    if guide.role != Role::Guide {
        return Err(ApiError::Forbidden("only guides can create tours".into()));
    }
    if req.max_group_size < 1 {
        return Err(ApiError::InvalidInput("group size must be at least 1".into()));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("title must not be blank".into()));
    }

    let tour = Tour::insert(
        &state.db,
        guide.id,
        req.title.trim(),
        &req.description,
        &req.location,
        &req.duration,
        req.max_group_size,
        req.price_per_person,
        req.scheduled_date,
        req.start_time,
    )
    .await?;

    // Tell followers about the new tour; purely best-effort.
    let follower_ids = follows::repo::follower_ids(&state.db, guide.id).await?;
    for follower_id in follower_ids {
        notifications::notify(
            &state.db,
            follower_id,
            &format!("New Tour from {}", guide.first_name),
            &format!("{} {}|{}", guide.first_name, guide.last_name, tour.title),
            kind::NEW_TOUR,
            Some(tour.id),
        )
        .await;
    }

    Ok(TourResponse::from(tour))
}

pub async fn get_tour(state: &AppState, id: Uuid) -> ApiResult<TourResponse> {
    let tour = Tour::find_by_id(&state.db, id)
        .await?
        .filter(|t| t.status != TourStatus::Deleted)
        .ok_or_else(|| ApiError::NotFound("tour not found".into()))?;
    Ok(TourResponse::from(tour))
}

pub async fn list_by_guide(state: &AppState, guide_id: Uuid) -> ApiResult<Vec<TourResponse>> {
    let tours = Tour::list_by_guide(&state.db, guide_id).await?;
    Ok(tours.into_iter().map(TourResponse::from).collect())
}

pub async fn update_tour(
    state: &AppState,
    guide_id: Uuid,
    tour_id: Uuid,
    req: CreateTourRequest,
) -> ApiResult<TourResponse> {
    let mut tx = state.db.begin().await?;

    let tour = Tour::find_for_update(&mut tx, tour_id)
        .await?
        .filter(|t| t.status != TourStatus::Deleted)
        .ok_or_else(|| ApiError::NotFound("tour not found".into()))?;
    if tour.guide_id != guide_id {
        return Err(ApiError::Forbidden(
            "you are not authorized to update this tour".into(),
        ));
    }

    // The new capacity must still fit everyone already booked.
    let occupied = tour.max_group_size - tour.available_spots;
    if req.max_group_size < occupied {
        return Err(ApiError::InvalidInput(format!(
            "maximum group size cannot be less than the number of booked seats ({occupied})"
        )));
    }
    let available_spots = req.max_group_size - occupied;

    let updated = Tour::update(
        &mut tx,
        tour.id,
        req.title.trim(),
        &req.description,
        &req.location,
        &req.duration,
        req.max_group_size,
        available_spots,
        req.price_per_person,
        req.scheduled_date,
        req.start_time,
    )
    .await?;

    tx.commit().await?;
    Ok(TourResponse::from(updated))
}

/// Everything a tour deletion must do, computed up front: which bookings get
/// cancelled and who hears about it. Keeping this a pure function makes the
/// cascade checkable without a database.
#[derive(Debug)]
pub struct DeletionPlan {
    pub tour_id: Uuid,
    pub cancel_booking_ids: Vec<Uuid>,
    pub notifications: Vec<PlannedNotification>,
}

#[derive(Debug)]
pub struct PlannedNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: &'static str,
    pub related_id: Option<Uuid>,
}

pub fn plan_deletion(tour: &Tour, confirmed: &[Booking]) -> DeletionPlan {
    DeletionPlan {
        tour_id: tour.id,
        cancel_booking_ids: confirmed.iter().map(|b| b.id).collect(),
        notifications: confirmed
            .iter()
            .map(|b| PlannedNotification {
                user_id: b.user_id,
                title: "Tour Cancelled".into(),
                message: tour.title.clone(),
                kind: kind::TOUR_CANCELLED,
                related_id: Some(tour.id),
            })
            .collect(),
    }
}

/// Soft-deletes a tour and cancels every confirmed booking on it. The status
/// flip and the cancellations commit together; bookings keep their rows, so
/// history survives.
pub async fn delete_tour(state: &AppState, guide_id: Uuid, tour_id: Uuid) -> ApiResult<()> {
    let mut tx = state.db.begin().await?;

    let tour = Tour::find_for_update(&mut tx, tour_id)
        .await?
        .filter(|t| t.status != TourStatus::Deleted)
        .ok_or_else(|| ApiError::NotFound("tour not found".into()))?;
    if tour.guide_id != guide_id {
        return Err(ApiError::Forbidden(
            "you are not authorized to delete this tour".into(),
        ));
    }

    let confirmed = Booking::confirmed_for_tour(&mut tx, tour.id).await?;
    let plan = plan_deletion(&tour, &confirmed);

    Booking::cancel_many(&mut tx, &plan.cancel_booking_ids).await?;
    Tour::set_status(&mut tx, tour.id, TourStatus::Deleted).await?;
    tx.commit().await?;

    for n in &plan.notifications {
        notifications::notify(&state.db, n.user_id, &n.title, &n.message, n.kind, n.related_id)
            .await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::repo::BookingStatus;
    use time::OffsetDateTime;

    fn tour(title: &str) -> Tour {
        Tour {
            id: Uuid::new_v4(),
            guide_id: Uuid::new_v4(),
            title: title.into(),
            description: "desc".into(),
            location: "Riga".into(),
            duration: "02:00".into(),
            max_group_size: 10,
            available_spots: 7,
            price_per_person: 25.0,
            scheduled_date: None,
            start_time: None,
            status: TourStatus::Active,
            rating: 0.0,
            reviews_count: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn booking(tour_id: Uuid) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tour_id,
            number_of_participants: 2,
            booking_date: OffsetDateTime::UNIX_EPOCH,
            status: BookingStatus::Confirmed,
        }
    }

    #[test]
    fn deletion_plan_covers_every_confirmed_booking() {
        let tour = tour("Old town walk");
        let bookings = vec![booking(tour.id), booking(tour.id), booking(tour.id)];

        let plan = plan_deletion(&tour, &bookings);

        assert_eq!(plan.tour_id, tour.id);
        assert_eq!(plan.cancel_booking_ids.len(), 3);
        assert_eq!(plan.notifications.len(), 3);
        for (b, n) in bookings.iter().zip(&plan.notifications) {
            assert!(plan.cancel_booking_ids.contains(&b.id));
            assert_eq!(n.user_id, b.user_id);
            assert_eq!(n.kind, kind::TOUR_CANCELLED);
            assert_eq!(n.message, "Old town walk");
            assert_eq!(n.related_id, Some(tour.id));
        }
    }

    #[test]
    fn deletion_plan_for_unbooked_tour_is_empty() {
        let tour = tour("Quiet tour");
        let plan = plan_deletion(&tour, &[]);
        assert!(plan.cancel_booking_ids.is_empty());
        assert!(plan.notifications.is_empty());
    }
}
