use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Persisted refresh token. One row per issued token; rotation deletes the
/// row, so presence in this table is what makes a refresh token live.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl RefreshTokenRecord {
    pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        token: &str,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Atomically consumes the token: the row is deleted and returned in one
    /// statement, so two concurrent refreshes cannot both claim it.
    pub async fn claim<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        token: &str,
    ) -> anyhow::Result<Option<RefreshTokenRecord>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            DELETE FROM refresh_tokens
            WHERE token = $1
            RETURNING id, token, user_id, expires_at, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    pub async fn delete_all_for_user<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        user_id: Uuid,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// One-time email verification code. At most one live code per user; issuing
/// a new one deletes the rest first.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCodeRecord {
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

impl VerificationCodeRecord {
    pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        code: &str,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens (code, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(code)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_by_code<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        code: &str,
    ) -> anyhow::Result<Option<VerificationCodeRecord>> {
        let record = sqlx::query_as::<_, VerificationCodeRecord>(
            "SELECT id, code, user_id, expires_at FROM verification_tokens WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// The most recently issued code for a user, for resend throttling.
    pub async fn latest_for_user<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        user_id: Uuid,
    ) -> anyhow::Result<Option<VerificationCodeRecord>> {
        let record = sqlx::query_as::<_, VerificationCodeRecord>(
            r#"
            SELECT id, code, user_id, expires_at
            FROM verification_tokens
            WHERE user_id = $1
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(db: E, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM verification_tokens WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete_all_for_user<'e, E: sqlx::PgExecutor<'e>>(
        db: E,
        user_id: Uuid,
    ) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
