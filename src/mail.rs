use axum::async_trait;
use tracing::info;

/// Outbound mail collaborator. The real SMTP transport plugs in behind this
/// trait; delivery failure is a recoverable error, never a panic.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()>;
}

/// Default mailer: writes the code to the application log. Good enough for
/// local development and for deployments that scrape codes out of the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()> {
        info!(%to, %code, "verification code issued");
        Ok(())
    }
}
