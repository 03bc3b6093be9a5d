//! Article generation.
//!
//! The model is asked for a JSON object holding the article markup and its
//! search tags, so tags never have to be scraped back out of the body.

use itertools::Itertools;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::AskAsync;
use crate::error::PipelineError;
use crate::models::{Faq, GeneratedArticle, Topic};
use crate::utils::{looks_truncated, model_json_object, normalize_title, strip_code_fences, truncate_for_log};

/// Tags used when the model suggests none.
pub const DEFAULT_TAGS: [&str; 3] = ["IT", "Business", "Trends"];

/// Upper bound on tags kept from the model.
const MAX_TAGS: usize = 10;

const MAX_FAQS: usize = 5;

#[derive(Debug, Deserialize)]
struct ArticleReply {
    html: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    faqs: Vec<Faq>,
}

#[derive(Debug)]
enum ParseFailure {
    /// The reply was cut off before the JSON closed.
    Truncated(String),
    Invalid(String),
}

/// Writes articles through the completion service.
#[derive(Debug)]
pub struct ArticleWriter<A> {
    ask: A,
    language: String,
}

impl<A> ArticleWriter<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(ask: A, language: impl Into<String>) -> Self {
        Self {
            ask,
            language: language.into(),
        }
    }

    fn prompt(&self, topic: &Topic) -> String {
        let keywords = if topic.related_queries.is_empty() {
            "(none)".to_string()
        } else {
            topic.related_queries.join(", ")
        };

        format!(
            r#"You are an SEO specialist and expert blogger who explains professional knowledge clearly.
Topic: "{title}"

Write a blog post in {language}, optimized for search ranking and ad-network approval:

1. Title: a curiosity-provoking headline containing the core keyword (h1).
2. Introduction: why the reader should care, with professional background.
3. Body:
   - at least three sections with subheadings (h2, h3)
   - explain technical terms plainly
   - use comparison tables and lists where they help
   - work in these related keywords: {keywords}
4. Conclusion: a summary and something for the reader to think about next.
5. Include a meta description of about 150 characters in a <p class="meta-description"> element.

Format the body as HTML (h1, h2, h3, p, ul, li, table, strong). Write naturally and with authority, at least 2,000 characters.

Reply with a single JSON object and nothing else:
{{"html": "<h1>...</h1>...", "tags": ["keyword 1", "keyword 2", "keyword 3", "keyword 4", "keyword 5"], "faqs": [{{"question": "...", "answer": "..."}}]}}
The "tags" list holds five high-quality search keywords for the post.
The "faqs" list holds up to three questions a reader would ask, each answered in one or two sentences."#,
            title = topic.title,
            language = self.language,
        )
    }

    /// Generate the article for `topic`.
    ///
    /// A reply that was cut off mid-JSON is re-asked once.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ContentFailure`] when the call fails or the reply
    /// cannot be turned into a non-empty article.
    #[instrument(level = "info", skip_all, fields(title = %topic.title))]
    pub async fn generate_article(&self, topic: &Topic) -> Result<GeneratedArticle, PipelineError> {
        let prompt = self.prompt(topic);
        info!("Generating article");

        let reply = self.ask_once(&prompt).await?;
        let parsed = match parse_article(&reply) {
            Err(ParseFailure::Truncated(e)) => {
                warn!(error = %e, "Article reply looks truncated; re-asking once");
                let second = self.ask_once(&prompt).await?;
                parse_article(&second)
            }
            other => other,
        };

        match parsed {
            Ok(article) => {
                info!(bytes = article.body.len(), tags = ?article.tags, "Article generated");
                Ok(article)
            }
            Err(ParseFailure::Truncated(e) | ParseFailure::Invalid(e)) => {
                warn!(reply = %truncate_for_log(&reply, 300), "Model returned a non-conforming article");
                Err(PipelineError::ContentFailure(e))
            }
        }
    }

    async fn ask_once(&self, prompt: &str) -> Result<String, PipelineError> {
        self.ask
            .ask(prompt)
            .await
            .map_err(|e| PipelineError::ContentFailure(e.to_string()))
    }
}

fn parse_article(reply: &str) -> Result<GeneratedArticle, ParseFailure> {
    let span = match model_json_object(reply) {
        Ok(span) => span,
        Err(cleaned) if cleaned.contains('{') => {
            return Err(ParseFailure::Truncated("article JSON never closes".to_string()));
        }
        Err(_) => return Err(ParseFailure::Invalid("no JSON object in reply".to_string())),
    };

    let raw: ArticleReply = serde_json::from_str(&span).map_err(|e| {
        if looks_truncated(&e) {
            ParseFailure::Truncated(e.to_string())
        } else {
            ParseFailure::Invalid(format!("article JSON: {e}"))
        }
    })?;

    let body = strip_code_fences(&raw.html);
    if body.is_empty() {
        return Err(ParseFailure::Invalid("article body is empty".to_string()));
    }

    Ok(GeneratedArticle {
        body,
        tags: clean_tags(raw.tags),
        faqs: clean_faqs(raw.faqs),
    })
}

/// Normalize, deduplicate and cap tags, falling back to [`DEFAULT_TAGS`].
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let cleaned: Vec<String> = tags
        .iter()
        .map(|t| normalize_title(t))
        .filter(|t| !t.is_empty())
        .unique()
        .take(MAX_TAGS)
        .collect();
    if cleaned.is_empty() {
        DEFAULT_TAGS.iter().map(|t| (*t).to_string()).collect()
    } else {
        cleaned
    }
}

fn clean_faqs(faqs: Vec<Faq>) -> Vec<Faq> {
    faqs.into_iter()
        .map(|faq| Faq {
            question: faq.question.trim().to_string(),
            answer: faq.answer.trim().to_string(),
        })
        .filter(|faq| !faq.question.is_empty() && !faq.answer.is_empty())
        .take(MAX_FAQS)
        .collect()
}
