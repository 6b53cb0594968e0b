use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an article in the host content system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ArticleId(pub i64);

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ArticleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Publication state of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Revision,
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArticleStatus::Draft => write!(f, "draft"),
            ArticleStatus::Published => write!(f, "published"),
            ArticleStatus::Revision => write!(f, "revision"),
        }
    }
}

/// An article as fetched from the host content system.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub body_html: String,
    /// Hand-written summary; empty when the author left it blank.
    pub excerpt: String,
    pub permalink: String,
    pub published_at: Option<DateTime<Utc>>,
    pub status: ArticleStatus,
}

impl Article {
    /// Only published, non-revision articles are announced to subscribers.
    pub fn is_notifiable(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// A row of the subscriber list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub subscribed_at: DateTime<Utc>,
}

/// A save event reported by the host content system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContentSaved {
    pub article_id: ArticleId,
    pub status: ArticleStatus,
    #[serde(default)]
    pub is_revision: bool,
}

/// A notification waiting for its quiet period to elapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub article_id: ArticleId,
    pub armed_at: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
    pub generation: u64,
}

/// A notification whose quiet period elapsed, handed to the dispatch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredNotification {
    pub article_id: ArticleId,
    /// Generation that was current when the winning `arm` happened.
    pub generation: u64,
}

/// Subject and HTML body ready to be mailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    pub subject: String,
    pub html_body: String,
}
