//! Article lookup: re-reads an article from the host content system at fire time.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use postbell_common::error::AppError;
use postbell_common::types::{Article, ArticleId};

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// `Ok(None)` when the article no longer exists.
    async fn fetch(&self, article_id: ArticleId) -> Result<Option<Article>, AppError>;
}

/// Reads the `articles` table maintained by the host.
#[derive(Clone)]
pub struct PgArticleSource {
    pool: PgPool,
}

impl PgArticleSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleSource for PgArticleSource {
    async fn fetch(&self, article_id: ArticleId) -> Result<Option<Article>, AppError> {
        let article: Option<Article> = sqlx::query_as(
            r#"
            SELECT id, title, body_html, excerpt, permalink, published_at, status
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }
}

/// Process-local article table, for embedding and tests.
#[derive(Default)]
pub struct InMemoryArticleSource {
    articles: RwLock<HashMap<ArticleId, Article>>,
}

impl InMemoryArticleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an article.
    pub async fn put(&self, article: Article) {
        self.articles.write().await.insert(article.id, article);
    }

    pub async fn remove(&self, article_id: ArticleId) -> Option<Article> {
        self.articles.write().await.remove(&article_id)
    }
}

#[async_trait]
impl ArticleSource for InMemoryArticleSource {
    async fn fetch(&self, article_id: ArticleId) -> Result<Option<Article>, AppError> {
        Ok(self.articles.read().await.get(&article_id).cloned())
    }
}
