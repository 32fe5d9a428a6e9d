use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tour_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TourStatus {
    Active,
    Deleted,
}

/// Tour row. `available_spots` is the capacity ledger; it is only ever
/// mutated inside a transaction that holds the row lock.
#[derive(Debug, Clone, FromRow)]
pub struct Tour {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub duration: String,
    pub max_group_size: i32,
    pub available_spots: i32,
    pub price_per_person: f64,
    pub scheduled_date: Option<Date>,
    pub start_time: Option<Time>,
    pub status: TourStatus,
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: OffsetDateTime,
}

const TOUR_COLUMNS: &str = "id, guide_id, title, description, location, duration, max_group_size, \
                            available_spots, price_per_person, scheduled_date, start_time, status, \
                            rating, reviews_count, created_at";

impl Tour {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        db: &PgPool,
        guide_id: Uuid,
        title: &str,
        description: &str,
        location: &str,
        duration: &str,
        max_group_size: i32,
        price_per_person: f64,
        scheduled_date: Option<Date>,
        start_time: Option<Time>,
    ) -> anyhow::Result<Tour> {
        let tour = sqlx::query_as::<_, Tour>(&format!(
            r#"
            INSERT INTO tours (guide_id, title, description, location, duration,
                               max_group_size, available_spots, price_per_person,
                               scheduled_date, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9)
            RETURNING {TOUR_COLUMNS}
            "#
        ))
        .bind(guide_id)
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(duration)
        .bind(max_group_size)
        .bind(price_per_person)
        .bind(scheduled_date)
        .bind(start_time)
        .fetch_one(db)
        .await?;
        Ok(tour)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Tour>> {
        let tour = sqlx::query_as::<_, Tour>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(tour)
    }

    /// Locks the tour row for the rest of the transaction. Every capacity
    /// mutation goes through this so concurrent bookings serialize per tour.
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> anyhow::Result<Option<Tour>> {
        let tour = sqlx::query_as::<_, Tour>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(tour)
    }

    pub async fn list_by_guide(db: &PgPool, guide_id: Uuid) -> anyhow::Result<Vec<Tour>> {
        let tours = sqlx::query_as::<_, Tour>(&format!(
            r#"
            SELECT {TOUR_COLUMNS}
            FROM tours
            WHERE guide_id = $1 AND status <> 'DELETED'
            ORDER BY created_at DESC
            "#
        ))
        .bind(guide_id)
        .fetch_all(db)
        .await?;
        Ok(tours)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        title: &str,
        description: &str,
        location: &str,
        duration: &str,
        max_group_size: i32,
        available_spots: i32,
        price_per_person: f64,
        scheduled_date: Option<Date>,
        start_time: Option<Time>,
    ) -> anyhow::Result<Tour> {
        let tour = sqlx::query_as::<_, Tour>(&format!(
            r#"
            UPDATE tours
            SET title = $2, description = $3, location = $4, duration = $5,
                max_group_size = $6, available_spots = $7, price_per_person = $8,
                scheduled_date = $9, start_time = $10
            WHERE id = $1
            RETURNING {TOUR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(duration)
        .bind(max_group_size)
        .bind(available_spots)
        .bind(price_per_person)
        .bind(scheduled_date)
        .bind(start_time)
        .fetch_one(&mut **tx)
        .await?;
        Ok(tour)
    }

    pub async fn take_spots(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        count: i32,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE tours SET available_spots = available_spots - $2 WHERE id = $1")
            .bind(id)
            .bind(count)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn release_spots(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        count: i32,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE tours SET available_spots = available_spots + $2 WHERE id = $1")
            .bind(id)
            .bind(count)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: TourStatus,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE tours SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
