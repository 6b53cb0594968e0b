use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// A single notification addressed to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    /// Correlates log lines for this delivery attempt
    pub id: Uuid,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingMail {
    pub fn new(
        to: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            to: to.into(),
            from: from.into(),
            subject: subject.into(),
            html_body: html_body.into(),
        }
    }
}

/// Delivers one HTML mail to one recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;

    /// Short transport name for logs.
    fn name(&self) -> &'static str;
}
