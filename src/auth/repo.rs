use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

/// User record in the database. Secrets never serialize.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub answer: String,
    pub role: UserRole,
    pub avatar_id: String,
    pub avatar_url: String,
    pub token: Option<String>,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, password_hash, answer, \
                            role, avatar_id, avatar_url, token, created_at";

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub answer: &'a str,
    pub avatar_id: &'a str,
    pub avatar_url: &'a str,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Locate a user by exact (email, security answer) pair. Used by the
    /// password-reset flow as a weak secondary factor.
    pub async fn find_by_email_and_answer(
        db: &PgPool,
        email: &str,
        answer: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND answer = $2"
        ))
        .bind(email)
        .bind(answer)
        .fetch_optional(db)
        .await
    }

    /// Insert a new user. The unique index on email is the authoritative
    /// duplicate check; a violation surfaces as `sqlx::Error::Database`.
    pub async fn create(db: &PgPool, new: &NewUser<'_>) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
             (first_name, last_name, email, phone, password_hash, answer, avatar_id, avatar_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.password_hash)
        .bind(new.answer)
        .bind(new.avatar_id)
        .bind(new.avatar_url)
        .fetch_one(db)
        .await
    }

    pub async fn set_avatar(
        db: &PgPool,
        id: Uuid,
        avatar_id: &str,
        avatar_url: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET avatar_id = $2, avatar_url = $3 WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(avatar_id)
        .bind(avatar_url)
        .fetch_one(db)
        .await
    }

    /// Overwrite the persisted session token. Each login replaces the
    /// previous token; there is no server-side invalidation path.
    pub async fn set_session_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET token = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(token)
        .fetch_one(db)
        .await
    }

    pub async fn set_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password_hash = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Partial profile update: absent fields keep their current value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&str>,
        avatar: Option<(&str, &str)>,
    ) -> Result<User, sqlx::Error> {
        let (avatar_id, avatar_url) = match avatar {
            Some((id, url)) => (Some(id), Some(url)),
            None => (None, None),
        };
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
               first_name = COALESCE($2, first_name), \
               last_name  = COALESCE($3, last_name), \
               phone      = COALESCE($4, phone), \
               avatar_id  = COALESCE($5, avatar_id), \
               avatar_url = COALESCE($6, avatar_url) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(avatar_id)
        .bind(avatar_url)
        .fetch_one(db)
        .await
    }

    pub async fn list(db: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@x.com".into(),
            phone: "+15550100".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            answer: "first pet".into(),
            role: UserRole::User,
            avatar_id: "avatar-default".into(),
            avatar_url: "https://static.estately.dev/avatar-default.jpg".into(),
            token: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn serialization_never_leaks_secrets() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("first pet"));
        assert!(json.contains("\"firstName\":\"Ada\""));
        assert!(json.contains("\"email\":\"ada@x.com\""));
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&UserRole::User).unwrap(), "\"USER\"");
    }

    #[test]
    fn token_appears_once_issued() {
        let mut user = sample_user();
        user.token = Some("signed.jwt.here".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("signed.jwt.here"));
    }
}
