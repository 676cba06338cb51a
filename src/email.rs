use axum::async_trait;
use tracing::info;

/// Email delivery abstraction. The deployed driver decides how a message
/// actually leaves the process (SMTP relay, provider API, ...).
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        info!(to_email = %to, %subject, body_len = html_body.len(), "email send stub");
        Ok(())
    }
}

pub fn verification_email_html(code: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif\">\
         <h2>Verify your email</h2>\
         <p>Use the following code to finish creating your account. \
         It expires in 5 minutes.</p>\
         <p style=\"font-size: 24px; letter-spacing: 4px\"><b>{code}</b></p>\
         </div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_embeds_code() {
        let html = verification_email_html("482913");
        assert!(html.contains("482913"));
        assert!(html.contains("Verify your email"));
    }

    #[tokio::test]
    async fn log_sender_always_delivers() {
        let sender = LogEmailSender;
        sender
            .send("a@x.com", "Verification Email", "<b>123456</b>")
            .await
            .expect("log sender should not fail");
    }
}
