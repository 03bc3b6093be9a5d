//! Key-facts extraction for the infographic.
//!
//! Optional: every failure ends in `None` and the infographic shows a
//! placeholder instead.

use tracing::{info, instrument, warn};

use crate::api::AskAsync;
use crate::error::PipelineError;
use crate::models::KeyFacts;
use crate::utils::{model_json_object, take_chars, truncate_for_log};

/// How much of the article body is sent to the model.
pub const FACTS_INPUT_CHARS: usize = 3000;

/// Extracts key facts through the completion service.
#[derive(Debug)]
pub struct FactExtractor<A> {
    ask: A,
}

impl<A> FactExtractor<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(ask: A) -> Self {
        Self { ask }
    }

    fn prompt(body: &str) -> String {
        format!(
            r#"Extract 3 to 5 key data points (figures, companies, technologies and the like) from the blog post below.
Answer with JSON only, in the same language as the post, and nothing else.

Post:
{post}

Output format (follow it exactly):
{{"headline": "one-line conclusion", "items": [{{"label": "item name", "detail": "explanation"}}]}}"#,
            post = take_chars(body, FACTS_INPUT_CHARS),
        )
    }

    /// Extract key facts from an article body, or `None` if that fails.
    #[instrument(level = "info", skip_all)]
    pub async fn extract_key_facts(&self, body: &str) -> Option<KeyFacts> {
        let reply = match self.ask.ask(&Self::prompt(body)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Key-facts extraction call failed");
                return None;
            }
        };

        match parse_key_facts(&reply) {
            Ok(facts) => {
                info!(items = facts.items.len(), "Extracted key facts");
                Some(facts)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    kind = e.kind(),
                    reply = %truncate_for_log(&reply, 300),
                    "Key-facts reply rejected"
                );
                None
            }
        }
    }
}

/// Normalize a key-facts reply into the one accepted shape.
pub fn parse_key_facts(reply: &str) -> Result<KeyFacts, PipelineError> {
    let span = model_json_object(reply)
        .map_err(|_| PipelineError::GenerationFailure("no JSON object in reply".to_string()))?;
    let mut facts: KeyFacts = serde_json::from_str(&span)
        .map_err(|e| PipelineError::GenerationFailure(format!("key facts shape: {e}")))?;

    facts.headline = facts.headline.trim().to_string();
    facts.items.retain(|item| !item.label.trim().is_empty() || !item.detail.trim().is_empty());
    if facts.items.is_empty() {
        return Err(PipelineError::GenerationFailure(
            "key facts contain no items".to_string(),
        ));
    }
    Ok(facts)
}
