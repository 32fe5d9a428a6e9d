use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tour_id: Uuid,
    pub number_of_participants: i32,
    pub booking_date: OffsetDateTime,
    pub status: BookingStatus,
}

/// A confirmed booking joined with the schedule of its tour, for overlap
/// checks and the completion sweep.
#[derive(Debug, Clone, FromRow)]
pub struct ConfirmedSchedule {
    pub booking_id: Uuid,
    pub tour_id: Uuid,
    pub tour_title: String,
    pub scheduled_date: Option<Date>,
    pub start_time: Option<Time>,
    pub duration: String,
}

/// Booking joined with tour and traveler details for listings.
#[derive(Debug, Clone, FromRow)]
pub struct BookingWithTour {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tour_id: Uuid,
    pub number_of_participants: i32,
    pub booking_date: OffsetDateTime,
    pub status: BookingStatus,
    pub tour_title: String,
    pub tour_location: String,
    pub scheduled_date: Option<Date>,
    pub start_time: Option<Time>,
    pub price_per_person: f64,
    pub traveler_first_name: String,
    pub traveler_last_name: String,
}

const BOOKING_COLUMNS: &str = "id, user_id, tour_id, number_of_participants, booking_date, status";

impl Booking {
    /// Raw sqlx error is surfaced so the caller can map the partial unique
    /// index on (user_id, tour_id) WHERE CONFIRMED to a conflict.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        tour_id: Uuid,
        number_of_participants: i32,
    ) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (user_id, tour_id, number_of_participants)
            VALUES ($1, $2, $3)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(tour_id)
        .bind(number_of_participants)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> anyhow::Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(booking)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(booking)
    }

    pub async fn exists_confirmed(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        tour_id: Uuid,
    ) -> anyhow::Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE user_id = $1 AND tour_id = $2 AND status = 'CONFIRMED'
            )
            "#,
        )
        .bind(user_id)
        .bind(tour_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists.0)
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: BookingStatus,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn confirmed_for_tour(
        tx: &mut Transaction<'_, Postgres>,
        tour_id: Uuid,
    ) -> anyhow::Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE tour_id = $1 AND status = 'CONFIRMED'"
        ))
        .bind(tour_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(bookings)
    }

    pub async fn cancel_many(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[Uuid],
    ) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED' WHERE id = ANY($1) AND status = 'CONFIRMED'",
        )
        .bind(ids)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Schedules of the traveler's other confirmed bookings, for the overlap
    /// scan inside the booking transaction.
    pub async fn confirmed_schedules_for_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<ConfirmedSchedule>> {
        let rows = sqlx::query_as::<_, ConfirmedSchedule>(
            r#"
            SELECT b.id AS booking_id, t.id AS tour_id, t.title AS tour_title,
                   t.scheduled_date, t.start_time, t.duration
            FROM bookings b
            JOIN tours t ON t.id = b.tour_id
            WHERE b.user_id = $1 AND b.status = 'CONFIRMED'
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows)
    }

    /// All confirmed bookings that have a schedule to compare against the
    /// clock; the completion sweep walks these.
    pub async fn confirmed_schedules(db: &PgPool) -> anyhow::Result<Vec<ConfirmedSchedule>> {
        let rows = sqlx::query_as::<_, ConfirmedSchedule>(
            r#"
            SELECT b.id AS booking_id, t.id AS tour_id, t.title AS tour_title,
                   t.scheduled_date, t.start_time, t.duration
            FROM bookings b
            JOIN tours t ON t.id = b.tour_id
            WHERE b.status = 'CONFIRMED'
              AND t.scheduled_date IS NOT NULL
              AND t.start_time IS NOT NULL
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Completes a booking only if it is still CONFIRMED at commit time, so
    /// the sweep can never resurrect a booking cancelled in the same window.
    pub async fn complete_if_confirmed(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'COMPLETED' WHERE id = $1 AND status = 'CONFIRMED'",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<BookingWithTour>> {
        let rows = sqlx::query_as::<_, BookingWithTour>(
            r#"
            SELECT b.id, b.user_id, b.tour_id, b.number_of_participants, b.booking_date, b.status,
                   t.title AS tour_title, t.location AS tour_location,
                   t.scheduled_date, t.start_time, t.price_per_person,
                   u.first_name AS traveler_first_name, u.last_name AS traveler_last_name
            FROM bookings b
            JOIN tours t ON t.id = b.tour_id
            JOIN users u ON u.id = b.user_id
            WHERE b.user_id = $1 AND t.status <> 'DELETED'
            ORDER BY b.booking_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_guide(
        db: &PgPool,
        guide_id: Uuid,
    ) -> anyhow::Result<Vec<BookingWithTour>> {
        let rows = sqlx::query_as::<_, BookingWithTour>(
            r#"
            SELECT b.id, b.user_id, b.tour_id, b.number_of_participants, b.booking_date, b.status,
                   t.title AS tour_title, t.location AS tour_location,
                   t.scheduled_date, t.start_time, t.price_per_person,
                   u.first_name AS traveler_first_name, u.last_name AS traveler_last_name
            FROM bookings b
            JOIN tours t ON t.id = b.tour_id
            JOIN users u ON u.id = b.user_id
            WHERE t.guide_id = $1 AND t.status <> 'DELETED'
            ORDER BY b.booking_date DESC
            "#,
        )
        .bind(guide_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
