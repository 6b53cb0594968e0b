//! Notification composer: turns a published article into a subject and HTML body.

use std::sync::LazyLock;

use handlebars::Handlebars;
use html_escape::decode_html_entities;
use regex::Regex;
use serde_json::json;

use postbell_common::config::NotifyConfig;
use postbell_common::error::AppError;
use postbell_common::types::{Article, ComposedMessage};

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

const ELLIPSIS: &str = "...";
const LINK_TEXT: &str = "Read the full post";

const SUBJECT_TEMPLATE: &str = "subject";
const ENVELOPE_TEMPLATE: &str = "envelope";

const SUBJECT: &str = "{{prefix}}{{title}}";
const ENVELOPE: &str = r#"<!DOCTYPE html>
<html>
<body>
<h2>{{title}}</h2>
<p>{{summary}}</p>
<p><a href="{{permalink}}">{{link_text}}</a></p>
</body>
</html>
"#;

/// Builds the fixed HTML envelope sent for a new or updated article.
///
/// Article fields are stored HTML-encoded by the host, so they are decoded
/// first and escaped exactly once by the template engine.
#[derive(Clone)]
pub struct NotificationComposer {
    templates: Handlebars<'static>,
    subject_prefix: String,
    excerpt_words: usize,
}

impl NotificationComposer {
    pub fn new(subject_prefix: impl Into<String>, excerpt_words: usize) -> Result<Self, AppError> {
        let mut templates = Handlebars::new();
        templates
            .register_template_string(SUBJECT_TEMPLATE, SUBJECT)
            .map_err(|e| AppError::Internal(format!("Invalid subject template: {}", e)))?;
        templates
            .register_template_string(ENVELOPE_TEMPLATE, ENVELOPE)
            .map_err(|e| AppError::Internal(format!("Invalid envelope template: {}", e)))?;

        Ok(Self {
            templates,
            subject_prefix: subject_prefix.into(),
            excerpt_words,
        })
    }

    pub fn from_config(config: &NotifyConfig) -> Result<Self, AppError> {
        Self::new(config.subject_prefix.clone(), config.excerpt_words)
    }

    /// Compose the message for `article`.
    ///
    /// Fails with `ArticleUnavailable` when the article is not published.
    pub fn build(&self, article: &Article) -> Result<ComposedMessage, AppError> {
        if !article.is_notifiable() {
            return Err(AppError::ArticleUnavailable(article.id));
        }

        let source = if article.excerpt.trim().is_empty() {
            &article.body_html
        } else {
            &article.excerpt
        };
        let data = json!({
            "prefix": self.subject_prefix,
            "title": decode_html_entities(article.title.trim()),
            "summary": trim_words(&plain_text(source), self.excerpt_words),
            "permalink": decode_html_entities(article.permalink.trim()),
            "link_text": LINK_TEXT,
        });

        let subject = self.render(SUBJECT_TEMPLATE, &data)?;
        let html_body = self.render(ENVELOPE_TEMPLATE, &data)?;

        Ok(ComposedMessage { subject, html_body })
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, AppError> {
        self.templates
            .render(name, data)
            .map_err(|e| AppError::Internal(format!("Failed to render {} template: {}", name, e)))
    }
}

/// Remove markup, dropping script/style contents entirely, then decode entities.
fn plain_text(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, " ");
    let text = TAG.replace_all(&without_code, " ");
    decode_html_entities(&text).into_owned()
}

/// Keep the first `max_words` whitespace-separated words, appending an
/// ellipsis only when something was cut.
fn trim_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let mut trimmed = words[..max_words].join(" ");
    trimmed.push_str(ELLIPSIS);
    trimmed
}
