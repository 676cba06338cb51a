use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub otp_ttl_minutes: i64,
    pub avatar_placeholder_id: String,
    pub avatar_placeholder_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "estately".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "estately-users".into()),
            session_ttl_days: std::env::var("JWT_SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let endpoint =
            std::env::var("MEDIA_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".into());
        let media = MediaConfig {
            public_url: std::env::var("MEDIA_PUBLIC_URL").unwrap_or_else(|_| endpoint.clone()),
            endpoint,
            bucket: std::env::var("MEDIA_BUCKET").unwrap_or_else(|_| "estately-media".into()),
            access_key: std::env::var("MEDIA_ACCESS_KEY")?,
            secret_key: std::env::var("MEDIA_SECRET_KEY")?,
        };
        Ok(Self {
            database_url,
            jwt,
            media,
            otp_ttl_minutes: std::env::var("OTP_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(5),
            avatar_placeholder_id: std::env::var("AVATAR_PLACEHOLDER_ID")
                .unwrap_or_else(|_| "avatar-default".into()),
            avatar_placeholder_url: std::env::var("AVATAR_PLACEHOLDER_URL")
                .unwrap_or_else(|_| "https://static.estately.dev/avatar-default.jpg".into()),
        })
    }
}
