use rand::Rng;
use tracing::{info, warn};

use crate::email::verification_email_html;
use crate::error::ApiError;
use crate::otp::repo::Otp;
use crate::state::AppState;

/// Attempts at the standard width before widening the code space.
const SHORT_ATTEMPTS: u32 = 5;
/// Total attempts before giving up entirely.
const MAX_ATTEMPTS: u32 = 8;

const SHORT_DIGITS: u32 = 6;
const WIDE_DIGITS: u32 = 8;

pub fn generate_code(digits: u32) -> String {
    let upper = 10u64.pow(digits);
    let n = rand::thread_rng().gen_range(0..upper);
    format!("{n:0width$}", width = digits as usize)
}

/// Issue a fresh one-time code for `email` and dispatch the verification
/// email. Collisions with live codes are detected by the store's unique
/// index; regeneration is bounded, widening the code space as a fallback.
pub async fn issue(st: &AppState, email: &str) -> Result<Otp, ApiError> {
    let swept = Otp::delete_expired(&st.db).await?;
    if swept > 0 {
        info!(swept, "expired otp records removed");
    }

    for attempt in 0..MAX_ATTEMPTS {
        let digits = if attempt < SHORT_ATTEMPTS {
            SHORT_DIGITS
        } else {
            WIDE_DIGITS
        };
        let code = generate_code(digits);

        match Otp::insert_unique(&st.db, email, &code, st.config.otp_ttl_minutes).await? {
            Some(otp) => {
                st.mailer
                    .send(email, "Verification Email", &verification_email_html(&otp.code))
                    .await
                    .map_err(|e| ApiError::Upstream(format!("verification email failed: {e}")))?;
                info!(%email, otp_id = %otp.id, "otp issued");
                return Ok(otp);
            }
            None => {
                warn!(%email, attempt, digits, "otp code collision, regenerating");
            }
        }
    }

    Err(ApiError::Internal(anyhow::anyhow!(
        "could not allocate a unique otp code after {MAX_ATTEMPTS} attempts"
    )))
}

/// Compare a submitted code against the live stored code for `email`.
/// Expired, missing, and mismatched codes are all rejected the same way.
pub async fn verify(st: &AppState, email: &str, submitted: &str) -> Result<(), ApiError> {
    match Otp::find_live_by_email(&st.db, email).await? {
        Some(otp) if otp.code == submitted => Ok(()),
        _ => Err(ApiError::Validation("invalid or expired otp".into())),
    }
}
