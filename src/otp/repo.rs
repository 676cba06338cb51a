use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// One-time code record. The code itself never serializes into responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Otp {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub code: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Otp {
    /// Insert a code, relying on the unique index over `code` for collision
    /// detection. Returns `None` when the code is already taken so the
    /// caller can regenerate.
    pub async fn insert_unique(
        db: &PgPool,
        email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<Option<Otp>, sqlx::Error> {
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
        sqlx::query_as::<_, Otp>(
            r#"
            INSERT INTO otps (email, code, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO NOTHING
            RETURNING id, email, code, created_at, expires_at
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .fetch_optional(db)
        .await
    }

    /// Latest live code for an email, if any.
    pub async fn find_live_by_email(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<Otp>, sqlx::Error> {
        sqlx::query_as::<_, Otp>(
            r#"
            SELECT id, email, code, created_at, expires_at
            FROM otps
            WHERE email = $1 AND expires_at > now()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Sweep expired rows so dead codes stop occupying the code space.
    pub async fn delete_expired(db: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM otps WHERE expires_at <= now()")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_withheld_from_responses() {
        let otp = Otp {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            code: "123456".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            expires_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(5),
        };
        let json = serde_json::to_string(&otp).unwrap();
        assert!(!json.contains("123456"));
        assert!(json.contains("\"email\":\"a@x.com\""));
        assert!(json.contains("createdAt"));
    }
}
