//! Subscription service: the subscribe/unsubscribe path used by the form integration.
//!
//! Raw input is validated here; the store only ever sees [`EmailAddress`] values.

use std::sync::Arc;

use postbell_common::email::EmailAddress;
use postbell_common::error::AppError;
use postbell_common::types::Subscriber;

use crate::store::SubscriberStore;

/// Service layer over a [`SubscriberStore`].
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriberStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriberStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn SubscriberStore> {
        self.store.clone()
    }

    /// Subscribe (or re-activate) an address.
    pub async fn subscribe(&self, raw_email: &str) -> Result<Subscriber, AppError> {
        let email = EmailAddress::parse(raw_email)?;
        self.store.upsert(&email).await
    }

    /// Unsubscribe an address. Returns whether the address was known.
    pub async fn unsubscribe(&self, raw_email: &str) -> Result<bool, AppError> {
        let email = EmailAddress::parse(raw_email)?;
        let known = self.store.deactivate(&email).await?;
        if !known {
            tracing::debug!(email = %email, "Unsubscribe for unknown address ignored");
        }
        Ok(known)
    }

    pub async fn active_emails(&self) -> Result<Vec<EmailAddress>, AppError> {
        self.store.active_emails().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySubscriberStore;

    fn service() -> (SubscriptionService, Arc<InMemorySubscriberStore>) {
        let store = Arc::new(InMemorySubscriberStore::new());
        (SubscriptionService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_subscribe_rejects_invalid_email() {
        let (service, store) = service();

        let err = service.subscribe("definitely not an email").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidEmail(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_empty_email() {
        let (service, store) = service();

        assert!(matches!(
            service.subscribe("").await,
            Err(AppError::InvalidEmail(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unsubscribe_then_resubscribe() {
        let (service, store) = service();

        service.subscribe("reader@example.com").await.unwrap();
        assert!(service.unsubscribe("reader@example.com").await.unwrap());
        assert!(service.active_emails().await.unwrap().is_empty());

        let again = service.subscribe("reader@example.com").await.unwrap();
        assert!(again.active);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_is_not_an_error() {
        let (service, _) = service();
        assert!(!service.unsubscribe("nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_unsubscribe_validates_input() {
        let (service, _) = service();
        assert!(matches!(
            service.unsubscribe("nope").await,
            Err(AppError::InvalidEmail(_))
        ));
    }
}
