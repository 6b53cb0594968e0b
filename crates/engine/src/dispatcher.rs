//! Dispatch worker: delivers fired notifications to active subscribers.
//!
//! For each fired notification:
//! 1. Re-fetch the article (skip if deleted or no longer published)
//! 2. Compose the message
//! 3. Load active subscriber addresses
//! 4. Send one mail per subscriber; a failed recipient is recorded and the
//!    batch carries on
//!
//! Fires for the same article run one at a time, and each (article,
//! generation) pair is processed at most once. Dispatch errors never travel
//! back to whoever armed the notification; they end up in the returned
//! [`DispatchReport`] and in the logs.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

use postbell_common::error::AppError;
use postbell_common::types::{ArticleId, FiredNotification};
use postbell_notifier::{MailTransport, OutgoingMail};

use crate::articles::ArticleSource;
use crate::composer::NotificationComposer;
use crate::store::SubscriberStore;

/// A recipient whose send attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendFailure {
    pub recipient: String,
    pub reason: String,
}

impl From<SendFailure> for AppError {
    fn from(failure: SendFailure) -> Self {
        AppError::SendFailure {
            recipient: failure.recipient,
            reason: failure.reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: Vec<String>,
    pub failed: Vec<SendFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered(DeliveryReport),
    /// Article missing, unpublished, or storage unreachable. Not retried.
    Skipped { reason: String },
    /// This generation (or a newer one) was already processed.
    Duplicate,
    NoSubscribers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    pub article_id: ArticleId,
    pub generation: u64,
    pub outcome: DispatchOutcome,
}

impl DispatchReport {
    pub fn sent_count(&self) -> usize {
        match &self.outcome {
            DispatchOutcome::Delivered(report) => report.sent.len(),
            _ => 0,
        }
    }

    pub fn failed_count(&self) -> usize {
        match &self.outcome {
            DispatchOutcome::Delivered(report) => report.failed.len(),
            _ => 0,
        }
    }
}

pub struct DispatchWorker {
    articles: Arc<dyn ArticleSource>,
    subscribers: Arc<dyn SubscriberStore>,
    transport: Arc<dyn MailTransport>,
    composer: NotificationComposer,
    from_address: String,
    /// Highest generation processed per article. One integer per article
    /// ever fired; it has to outlive the gate to reject late duplicates.
    processed: Mutex<HashMap<ArticleId, u64>>,
    /// Serialises fires of the same article. Entries exist only while a
    /// fire of that article is running or waiting.
    gates: DashMap<ArticleId, Arc<tokio::sync::Mutex<()>>>,
}

impl DispatchWorker {
    pub fn new(
        articles: Arc<dyn ArticleSource>,
        subscribers: Arc<dyn SubscriberStore>,
        transport: Arc<dyn MailTransport>,
        composer: NotificationComposer,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            articles,
            subscribers,
            transport,
            composer,
            from_address: from_address.into(),
            processed: Mutex::new(HashMap::new()),
            gates: DashMap::new(),
        }
    }

    /// Drain fired notifications, dispatching each on its own task.
    ///
    /// Returns once every scheduler handle is dropped and the dispatches
    /// already started have finished. Aborting the returned future aborts
    /// those dispatches too.
    pub async fn run(self: Arc<Self>, mut fired: mpsc::UnboundedReceiver<FiredNotification>) {
        tracing::info!(transport = self.transport.name(), "Dispatch worker started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                received = fired.recv() => match received {
                    Some(notification) => {
                        let worker = self.clone();
                        in_flight.spawn(async move {
                            worker.fire(notification).await;
                        });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Dispatch task failed");
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::info!(in_flight = in_flight.len(), "Waiting for in-flight dispatches");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Dispatch task failed");
            }
        }

        tracing::info!("Dispatch worker stopped");
    }

    /// Process one fired notification.
    pub async fn fire(&self, fired: FiredNotification) -> DispatchReport {
        let gate = self
            .gates
            .entry(fired.article_id)
            .or_default()
            .clone();

        let report = {
            let _guard = gate.lock().await;
            self.fire_gated(fired).await
        };

        // Only the map's own reference left: no fire of this article is waiting.
        drop(gate);
        self.gates
            .remove_if(&fired.article_id, |_, gate| Arc::strong_count(gate) == 1);

        report
    }

    async fn fire_gated(&self, fired: FiredNotification) -> DispatchReport {
        let dispatch_id = Uuid::new_v4();
        let outcome = if self.claim(&fired) {
            self.deliver(dispatch_id, &fired).await
        } else {
            tracing::debug!(
                article_id = %fired.article_id,
                generation = fired.generation,
                "Duplicate fire ignored"
            );
            DispatchOutcome::Duplicate
        };

        let report = DispatchReport {
            dispatch_id,
            article_id: fired.article_id,
            generation: fired.generation,
            outcome,
        };

        if let DispatchOutcome::Delivered(delivery) = &report.outcome {
            tracing::info!(
                %dispatch_id,
                article_id = %fired.article_id,
                generation = fired.generation,
                sent = delivery.sent.len(),
                failed = delivery.failed.len(),
                "Notification dispatched"
            );
        }

        report
    }

    /// Record `fired` as processed unless it is not newer than the last one.
    fn claim(&self, fired: &FiredNotification) -> bool {
        let mut processed = self.processed.lock();
        let last = processed.entry(fired.article_id).or_insert(0);
        if fired.generation <= *last {
            return false;
        }
        *last = fired.generation;
        true
    }

    async fn deliver(&self, dispatch_id: Uuid, fired: &FiredNotification) -> DispatchOutcome {
        let article = match self.articles.fetch(fired.article_id).await {
            Ok(Some(article)) => article,
            Ok(None) => return skipped(AppError::ArticleUnavailable(fired.article_id)),
            Err(e) => {
                tracing::error!(article_id = %fired.article_id, error = %e, "Article lookup failed");
                return skipped(e);
            }
        };

        let message = match self.composer.build(&article) {
            Ok(message) => message,
            Err(e) => return skipped(e),
        };

        let recipients = match self.subscribers.active_emails().await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(article_id = %fired.article_id, error = %e, "Subscriber lookup failed");
                return skipped(e);
            }
        };

        if recipients.is_empty() {
            tracing::info!(article_id = %fired.article_id, "No active subscribers");
            return DispatchOutcome::NoSubscribers;
        }

        let mut report = DeliveryReport::default();
        for recipient in recipients {
            let mail = OutgoingMail::new(
                recipient.as_str(),
                &self.from_address,
                &message.subject,
                &message.html_body,
            );

            match self.transport.send(&mail).await {
                Ok(()) => report.sent.push(recipient.into_inner()),
                Err(e) => {
                    let failure = SendFailure {
                        recipient: recipient.into_inner(),
                        reason: format!("{e:#}"),
                    };
                    tracing::warn!(
                        %dispatch_id,
                        mail_id = %mail.id,
                        error = %AppError::from(failure.clone()),
                        "Notification send failed"
                    );
                    report.failed.push(failure);
                }
            }
        }

        DispatchOutcome::Delivered(report)
    }
}

fn skipped(error: AppError) -> DispatchOutcome {
    tracing::info!(error = %error, "Dispatch skipped");
    DispatchOutcome::Skipped {
        reason: error.to_string(),
    }
}
