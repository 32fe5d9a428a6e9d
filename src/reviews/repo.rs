use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub guide_id: Uuid,
    pub tour_id: Uuid,
    pub tour_rating: i32,
    pub guide_rating: i32,
    pub comment: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Review joined with the reviewer's name for listings.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithReviewer {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub guide_id: Uuid,
    pub tour_id: Uuid,
    pub tour_rating: i32,
    pub guide_rating: i32,
    pub comment: Option<String>,
    pub created_at: OffsetDateTime,
    pub reviewer_first_name: String,
    pub reviewer_last_name: String,
}

const REVIEW_COLUMNS: &str = "id, booking_id, reviewer_id, guide_id, tour_id, tour_rating, \
                              guide_rating, comment, created_at";

impl Review {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
        reviewer_id: Uuid,
        guide_id: Uuid,
        tour_id: Uuid,
        tour_rating: i32,
        guide_rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (booking_id, reviewer_id, guide_id, tour_id,
                                 tour_rating, guide_rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(booking_id)
        .bind(reviewer_id)
        .bind(guide_id)
        .bind(tour_id)
        .bind(tour_rating)
        .bind(guide_rating)
        .bind(comment)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn exists_for_booking(db: &PgPool, booking_id: Uuid) -> anyhow::Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM reviews WHERE booking_id = $1)")
                .bind(booking_id)
                .fetch_one(db)
                .await?;
        Ok(exists.0)
    }

    /// Full recompute of the guide's aggregate rating. Recomputing from
    /// scratch each time keeps the stored value consistent with the rows no
    /// matter what happened before.
    pub async fn recompute_guide_stats(
        tx: &mut Transaction<'_, Postgres>,
        guide_id: Uuid,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET rating = COALESCE((SELECT AVG(guide_rating) FROM reviews WHERE guide_id = $1), 0),
                reviews_count = (SELECT COUNT(*) FROM reviews WHERE guide_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(guide_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Full recompute of the tour's aggregate rating.
    pub async fn recompute_tour_stats(
        tx: &mut Transaction<'_, Postgres>,
        tour_id: Uuid,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE tours
            SET rating = COALESCE((SELECT AVG(tour_rating) FROM reviews WHERE tour_id = $1), 0),
                reviews_count = (SELECT COUNT(*) FROM reviews WHERE tour_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(tour_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn list_for_tour(
        db: &PgPool,
        tour_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewWithReviewer>> {
        let rows = sqlx::query_as::<_, ReviewWithReviewer>(
            r#"
            SELECT r.id, r.booking_id, r.reviewer_id, r.guide_id, r.tour_id,
                   r.tour_rating, r.guide_rating, r.comment, r.created_at,
                   u.first_name AS reviewer_first_name, u.last_name AS reviewer_last_name
            FROM reviews r
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.tour_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(tour_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_guide(
        db: &PgPool,
        guide_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewWithReviewer>> {
        let rows = sqlx::query_as::<_, ReviewWithReviewer>(
            r#"
            SELECT r.id, r.booking_id, r.reviewer_id, r.guide_id, r.tour_id,
                   r.tour_rating, r.guide_rating, r.comment, r.created_at,
                   u.first_name AS reviewer_first_name, u.last_name AS reviewer_last_name
            FROM reviews r
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.guide_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(guide_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
