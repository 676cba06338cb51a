use axum::extract::Multipart;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub new_password: String,
}

/// Uploaded file pulled out of a multipart field.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub body: Bytes,
    pub content_type: String,
}

/// Registration form: multipart user fields plus a single `avatar` file.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub otp: String,
    pub answer: String,
    pub avatar: Option<FileUpload>,
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<FileUpload, ApiError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".into());
    let body = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("unreadable file field: {e}")))?;
    Ok(FileUpload { body, content_type })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("unreadable form field: {e}")))
}

impl RegisterForm {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = RegisterForm::default();
        while let Ok(Some(field)) = mp.next_field().await {
            match field.name().map(|s| s.to_string()).as_deref() {
                Some("firstName") => form.first_name = read_text(field).await?,
                Some("lastName") => form.last_name = read_text(field).await?,
                Some("email") => form.email = read_text(field).await?.trim().to_lowercase(),
                Some("phone") => form.phone = read_text(field).await?,
                Some("password") => form.password = read_text(field).await?,
                Some("otp") => form.otp = read_text(field).await?,
                Some("answer") => form.answer = read_text(field).await?,
                Some("avatar") => form.avatar = Some(read_file(field).await?),
                _ => {}
            }
        }
        Ok(form)
    }

    /// Every required field must be present; the check is an explicit
    /// conjunction so that no field is silently skipped.
    pub fn validate(&self) -> Result<(), ApiError> {
        let missing: Vec<&str> = [
            ("firstName", self.first_name.is_empty()),
            ("lastName", self.last_name.is_empty()),
            ("email", self.email.is_empty()),
            ("phone", self.phone.is_empty()),
            ("password", self.password.is_empty()),
            ("otp", self.otp.is_empty()),
            ("answer", self.answer.is_empty()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(ApiError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::Validation("invalid email".into()));
        }
        Ok(())
    }
}

/// Profile update form: every field optional, provided fields overwrite.
#[derive(Debug, Default)]
pub struct UpdateUserForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<FileUpload>,
}

impl UpdateUserForm {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = UpdateUserForm::default();
        while let Ok(Some(field)) = mp.next_field().await {
            match field.name().map(|s| s.to_string()).as_deref() {
                Some("firstName") => form.first_name = Some(read_text(field).await?),
                Some("lastName") => form.last_name = Some(read_text(field).await?),
                Some("phone") => form.phone = Some(read_text(field).await?),
                Some("avatar") => form.avatar = Some(read_file(field).await?),
                _ => {}
            }
        }
        Ok(form)
    }
}
