//! Log-backed notifier. The real mail transport is an external
//! collaborator; this adapter records the would-be delivery in the
//! application log and always succeeds.

use async_trait::async_trait;

use domains::{Notifier, Result};

pub struct LogNotifier {
    from_addr: String,
}

impl LogNotifier {
    pub fn new(from_addr: impl Into<String>) -> Self {
        Self {
            from_addr: from_addr.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<()> {
        tracing::info!(
            from = %self.from_addr,
            to = ?to,
            subject,
            bytes = body.len(),
            "outbound notice"
        );
        Ok(())
    }
}
