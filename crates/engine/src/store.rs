//! Subscriber store: the list of addresses that receive post notifications.
//!
//! Rows are never removed: unsubscribing flips `active` off, and
//! re-subscribing flips it back on, so the same address can never appear
//! twice. Only [`EmailAddress`] values reach the store, which keeps invalid
//! input out of it entirely.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use postbell_common::email::EmailAddress;
use postbell_common::error::AppError;
use postbell_common::types::Subscriber;

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Addresses of all active subscribers, in no particular order.
    async fn active_emails(&self) -> Result<Vec<EmailAddress>, AppError>;

    /// Mark `email` active, creating its row when absent.
    async fn upsert(&self, email: &EmailAddress) -> Result<Subscriber, AppError>;

    /// Mark `email` inactive. Returns `false` (not an error) when the address is unknown.
    async fn deactivate(&self, email: &EmailAddress) -> Result<bool, AppError>;

    async fn get(&self, email: &EmailAddress) -> Result<Option<Subscriber>, AppError>;
}

/// Re-validate addresses read back from storage, dropping any that no longer parse.
fn revalidate(rows: impl IntoIterator<Item = String>) -> Vec<EmailAddress> {
    rows.into_iter()
        .filter_map(|raw| match EmailAddress::parse(&raw) {
            Ok(email) => Some(email),
            Err(e) => {
                tracing::warn!(email = %raw, error = %e, "Skipping invalid stored subscriber");
                None
            }
        })
        .collect()
}

/// Postgres-backed store over the `subscribers` table.
#[derive(Clone)]
pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    async fn active_emails(&self) -> Result<Vec<EmailAddress>, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT email FROM subscribers WHERE active = true")
                .fetch_all(&self.pool)
                .await?;

        Ok(revalidate(rows.into_iter().map(|(email,)| email)))
    }

    async fn upsert(&self, email: &EmailAddress) -> Result<Subscriber, AppError> {
        let subscriber: Subscriber = sqlx::query_as(
            r#"
            INSERT INTO subscribers (email, active)
            VALUES ($1, true)
            ON CONFLICT (email) DO UPDATE SET active = true
            RETURNING id, email, active, subscribed_at
            "#,
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(subscriber_id = subscriber.id, email = %email, "Subscriber activated");
        Ok(subscriber)
    }

    async fn deactivate(&self, email: &EmailAddress) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE subscribers SET active = false WHERE email = $1")
            .bind(email.as_str())
            .execute(&self.pool)
            .await?;

        let known = result.rows_affected() > 0;
        if known {
            tracing::info!(email = %email, "Subscriber deactivated");
        }
        Ok(known)
    }

    async fn get(&self, email: &EmailAddress) -> Result<Option<Subscriber>, AppError> {
        let subscriber: Option<Subscriber> = sqlx::query_as(
            "SELECT id, email, active, subscribed_at FROM subscribers WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscriber)
    }
}

/// Process-local store. Writers take the lock exclusively, so concurrent
/// dispatch reads never observe a half-applied change.
#[derive(Default)]
pub struct InMemorySubscriberStore {
    rows: RwLock<HashMap<EmailAddress, Subscriber>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows, active or not.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn active_emails(&self) -> Result<Vec<EmailAddress>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|(_, sub)| sub.active)
            .map(|(email, _)| email.clone())
            .collect())
    }

    async fn upsert(&self, email: &EmailAddress) -> Result<Subscriber, AppError> {
        let mut rows = self.rows.write().await;
        let next_id = rows.len() as i64 + 1;

        let subscriber = rows.entry(email.clone()).or_insert_with(|| Subscriber {
            id: next_id,
            email: email.to_string(),
            active: true,
            subscribed_at: Utc::now(),
        });
        subscriber.active = true;

        Ok(subscriber.clone())
    }

    async fn deactivate(&self, email: &EmailAddress) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(email) {
            Some(subscriber) => {
                subscriber.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, email: &EmailAddress) -> Result<Option<Subscriber>, AppError> {
        Ok(self.rows.read().await.get(email).cloned())
    }
}
