use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub async fn follower_ids(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT follower_id FROM follows WHERE followee_id = $1")
            .bind(user_id)
            .fetch_all(db)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Returns false when the pair already exists.
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    follower_id: Uuid,
    followee_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO follows (follower_id, followee_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(follower_id)
    .bind(followee_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when there was nothing to remove.
pub async fn delete(
    tx: &mut Transaction<'_, Postgres>,
    follower_id: Uuid,
    followee_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Re-derives both users' follow counters from the follows table inside the
/// same transaction as the row change.
pub async fn refresh_counts(
    tx: &mut Transaction<'_, Postgres>,
    follower_id: Uuid,
    followee_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET following_count = (SELECT COUNT(*) FROM follows WHERE follower_id = $1)
        WHERE id = $1
        "#,
    )
    .bind(follower_id)
    .execute(&mut **tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE users
        SET follower_count = (SELECT COUNT(*) FROM follows WHERE followee_id = $1)
        WHERE id = $1
        "#,
    )
    .bind(followee_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
