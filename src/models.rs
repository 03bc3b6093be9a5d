//! Data models shared across the pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Topic`]: A candidate subject for an article
//! - [`HistoryDocument`] and [`HistoryRecord`]: The persisted posting history
//! - [`GeneratedArticle`] and [`KeyFacts`]: Normalized model output used for rendering
//! - [`Selection`] and [`RunOutcome`]: Results handed back to the caller
//!
//! Field names that travel through JSON files or model prompts use camelCase
//! on the wire via `#[serde(rename_all = "camelCase")]`.

use crate::utils::normalize_title;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate subject for an article.
///
/// Titles are always whitespace-normalized and non-empty; build one through
/// [`Topic::new`] to keep that true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// The normalized title.
    pub title: String,
    /// Related search terms used to steer the article.
    #[serde(default)]
    pub related_queries: Vec<String>,
}

impl Topic {
    /// Build a topic, normalizing the title.
    ///
    /// Returns `None` when the title is empty after normalization.
    pub fn new(title: &str, related_queries: Vec<String>) -> Option<Self> {
        let title = normalize_title(title);
        if title.is_empty() {
            return None;
        }
        let related_queries = related_queries
            .iter()
            .map(|q| normalize_title(q))
            .filter(|q| !q.is_empty())
            .collect();
        Some(Self {
            title,
            related_queries,
        })
    }
}

/// One trending search as delivered by the trends provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingTopic {
    pub title: String,
    /// Human-formatted traffic estimate, e.g. `"200K+"`.
    pub traffic: Option<String>,
    pub related_queries: Vec<String>,
}

impl TrendingTopic {
    /// Convert to a [`Topic`], dropping the traffic figure.
    pub fn into_topic(self) -> Option<Topic> {
        Topic::new(&self.title, self.related_queries)
    }
}

/// A content category with its pillar topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub pillars: Vec<String>,
}

/// A single entry of the posting history. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// When the topic was recorded (RFC 3339).
    pub date: DateTime<Utc>,
    pub topic: String,
    pub category: String,
    pub pillar: String,
}

/// The whole on-disk history document.
///
/// # JSON Shape
///
/// ```text
/// {
///   "categories": [{ "name": "...", "pillars": [] }],
///   "history": [{ "date": "...", "topic": "...", "category": "...", "pillar": "..." }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl HistoryDocument {
    /// Titles of every recorded post, oldest first.
    pub fn posted_titles(&self) -> Vec<String> {
        self.history.iter().map(|r| r.topic.clone()).collect()
    }
}

/// Article produced by the model, already split into body and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    /// Article markup (HTML fragment, no surrounding document).
    pub body: String,
    /// Search keywords suggested for the article.
    pub tags: Vec<String>,
    /// Reader questions answered by the article, possibly none.
    pub faqs: Vec<Faq>,
}

/// Key facts pulled out of an article for the infographic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFacts {
    /// One-line conclusion shown under the table.
    pub headline: String,
    pub items: Vec<KeyFact>,
}

/// One row of the infographic table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFact {
    pub label: String,
    pub detail: String,
}

/// A question/answer pair for FAQ schema markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Faq {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// A post accepted by the blog API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedPost {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Where a selected topic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicOrigin {
    /// An unused entry of the trend feed (or its fallback list).
    Trend,
    /// A topic proposed by the model.
    Generated,
}

/// The successful result of topic selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub topic: Topic,
    /// Attempt number on which the topic was accepted (1-based).
    pub attempts: usize,
    pub origin: TopicOrigin,
}

/// What a successful pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The post was published and recorded in history.
    Published {
        title: String,
        post_id: String,
        attempts: usize,
    },
    /// Selection and rendering ran, nothing was published or recorded.
    DryRun {
        title: String,
        tags: Vec<String>,
        html_len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_new_normalizes_title() {
        let topic = Topic::new("  Rust   in \n production  ", vec![" async ".into(), " ".into()]).unwrap();
        assert_eq!(topic.title, "Rust in production");
        assert_eq!(topic.related_queries, vec!["async".to_string()]);
    }

    #[test]
    fn test_topic_new_rejects_blank_title() {
        assert!(Topic::new("   \t ", vec![]).is_none());
    }

    #[test]
    fn test_topic_deserializes_camel_case() {
        let json = r#"{"title": "X", "relatedQueries": ["a", "b"]}"#;
        let topic: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.title, "X");
        assert_eq!(topic.related_queries, vec!["a", "b"]);
    }

    #[test]
    fn test_history_document_deserialization() {
        let json = r#"{
            "categories": [{ "name": "IT & Technology", "pillars": [] }],
            "history": [
                { "date": "2025-05-06T08:00:00.000Z", "topic": "A", "category": "General", "pillar": "Trend" },
                { "date": "2025-05-07T08:00:00.000Z", "topic": "B", "category": "General", "pillar": "Trend" }
            ]
        }"#;

        let doc: HistoryDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.categories.len(), 1);
        assert_eq!(doc.posted_titles(), vec!["A", "B"]);
    }

    #[test]
    fn test_trending_topic_into_topic() {
        let trend = TrendingTopic {
            title: " Solar  eclipse ".into(),
            traffic: Some("500K+".into()),
            related_queries: vec!["eclipse time".into()],
        };
        let topic = trend.into_topic().unwrap();
        assert_eq!(topic.title, "Solar eclipse");
        assert_eq!(topic.related_queries, vec!["eclipse time"]);
    }
}
