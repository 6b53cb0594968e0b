//! In-memory transport that captures mail instead of delivering it.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::transport::{MailTransport, OutgoingMail};

/// Captures every mail it is asked to send. Recipients listed in
/// `failing` get an error instead, as a refusing SMTP relay would.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    failing: Arc<HashSet<String>>,
    attempts: Arc<AtomicUsize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that fails for every recipient in `recipients`.
    pub fn failing_for<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: Arc::new(recipients.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, recipient: &str) -> bool {
        self.sent.lock().await.iter().any(|m| m.to == recipient)
    }

    /// Number of send calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&mail.to) {
            anyhow::bail!("recipient {} refused by relay", mail.to);
        }

        self.sent.lock().await.push(mail.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
