//! Model-generated topic candidates.
//!
//! Used whenever the trend feed has nothing unused to offer. Any failure
//! (network, unparsable reply, wrong shape) is logged as a generation failure
//! and reported as "no candidate" so the selection loop can move on.

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api::AskAsync;
use crate::error::PipelineError;
use crate::models::Topic;
use crate::topics::recent_titles;
use crate::topics::selection::CandidateSource;
use crate::utils::{parse_model_json, truncate_for_log};

/// Proposes a new topic through the completion service.
#[derive(Debug)]
pub struct TopicGenerator<A> {
    ask: A,
    language: String,
}

impl<A> TopicGenerator<A>
where
    A: AskAsync<Response = String>,
{
    /// `language` is the language the blog is written in.
    pub fn new(ask: A, language: impl Into<String>) -> Self {
        Self {
            ask,
            language: language.into(),
        }
    }

    fn prompt(&self, avoid: &[String]) -> String {
        let avoid_block = if avoid.is_empty() {
            "(none yet)".to_string()
        } else {
            avoid
                .iter()
                .map(|t| format!("- {t}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"You are the editor of a blog that publishes in-depth expert articles in {language}.
Propose exactly ONE new article topic that readers are searching for right now.
Favour economics, personal finance, technology, AI and crypto subjects with lasting search demand.

Recently published topics (do not repeat or closely rephrase any of them):
{avoid_block}

Reply with a single JSON object and nothing else, in this exact format:
{{"title": "Article topic in {language}", "relatedQueries": ["search keyword 1", "search keyword 2", "search keyword 3"]}}"#,
            language = self.language,
        )
    }
}

impl<A> CandidateSource for TopicGenerator<A>
where
    A: AskAsync<Response = String>,
{
    #[instrument(level = "info", skip_all)]
    async fn generate_candidate(&self, avoid: &[String]) -> Option<Topic> {
        let prompt = self.prompt(recent_titles(avoid));
        let outcome = match self.ask.ask(&prompt).await {
            Ok(reply) => parse_candidate(&reply).inspect_err(|_| {
                warn!(reply = %truncate_for_log(&reply, 300), "Unusable topic reply");
            }),
            Err(e) => Err(PipelineError::GenerationFailure(e.to_string())),
        };

        match outcome {
            Ok(topic) => {
                info!(title = %topic.title, "Model proposed a topic");
                Some(topic)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Topic generation failed");
                None
            }
        }
    }
}

/// Normalize a topic reply into a [`Topic`].
///
/// Accepts a fenced or chatty reply as long as the first JSON span is either a
/// `{title, relatedQueries}` object or an array whose first element is one.
pub fn parse_candidate(reply: &str) -> Result<Topic, PipelineError> {
    let value = parse_model_json(reply).map_err(PipelineError::GenerationFailure)?;
    let object = match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };
    let object = object.as_object().ok_or_else(|| {
        PipelineError::GenerationFailure("topic reply is not a JSON object".to_string())
    })?;

    let title = object
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::GenerationFailure("topic reply has no title".to_string()))?;

    let related_queries = match object.get("relatedQueries") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|q| {
                q.as_str().map(str::to_string).ok_or_else(|| {
                    PipelineError::GenerationFailure("relatedQueries must hold strings".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(PipelineError::GenerationFailure(
                "relatedQueries is not a list".to_string(),
            ));
        }
    };

    Topic::new(title, related_queries)
        .ok_or_else(|| PipelineError::GenerationFailure("topic title is empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedAsk;

    #[test]
    fn test_parse_candidate_plain_object() {
        let topic = parse_candidate(r#"{"title": "X", "relatedQueries": ["a", "b"]}"#).unwrap();
        assert_eq!(topic.title, "X");
        assert_eq!(topic.related_queries, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_candidate_fenced_and_chatty() {
        let reply = "Here is a topic:\n```json\n{\"title\": \"  Quantum   computing \", \"relatedQueries\": []}\n```";
        let topic = parse_candidate(reply).unwrap();
        assert_eq!(topic.title, "Quantum computing");
        assert!(topic.related_queries.is_empty());
    }

    #[test]
    fn test_parse_candidate_array_takes_first() {
        let topic = parse_candidate(r#"[{"title": "First"}, {"title": "Second"}]"#).unwrap();
        assert_eq!(topic.title, "First");
    }

    #[test]
    fn test_parse_candidate_missing_title() {
        let err = parse_candidate(r#"{"relatedQueries": ["a"]}"#).unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailure(_)));
    }

    #[test]
    fn test_parse_candidate_non_list_queries() {
        assert!(parse_candidate(r#"{"title": "X", "relatedQueries": "a, b"}"#).is_err());
        assert!(parse_candidate(r#"{"title": "X", "relatedQueries": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_parse_candidate_blank_title_or_garbage() {
        assert!(parse_candidate(r#"{"title": "   "}"#).is_err());
        assert!(parse_candidate("I cannot help with that.").is_err());
        assert!(parse_candidate("[]").is_err());
    }

    #[tokio::test]
    async fn test_generate_candidate_success() {
        let ask = ScriptedAsk::new([Some(r#"{"title": "X", "relatedQueries": ["a", "b"]}"#)]);
        let generator = TopicGenerator::new(&ask, "Korean");

        let avoid = vec!["Old topic".to_string()];
        let topic = generator.generate_candidate(&avoid).await.unwrap();
        assert_eq!(topic.title, "X");
        assert_eq!(ask.calls(), 1);

        let prompt = ask.prompts.borrow()[0].clone();
        assert!(prompt.contains("- Old topic"));
        assert!(prompt.contains("Korean"));
    }

    #[tokio::test]
    async fn test_generate_candidate_failure_is_none() {
        let ask = ScriptedAsk::new([None, Some("not json at all")]);
        let generator = TopicGenerator::new(&ask, "English");

        assert!(generator.generate_candidate(&[]).await.is_none());
        assert!(generator.generate_candidate(&[]).await.is_none());
        assert_eq!(ask.calls(), 2);
    }

    #[tokio::test]
    async fn test_prompt_shows_only_recent_titles() {
        let ask = ScriptedAsk::new([Some(r#"{"title": "Y"}"#)]);
        let generator = TopicGenerator::new(&ask, "English");
        let avoid: Vec<String> = (0..20).map(|i| format!("topic-{i:02}")).collect();

        generator.generate_candidate(&avoid).await.unwrap();
        let prompt = ask.prompts.borrow()[0].clone();
        assert!(!prompt.contains("topic-04"));
        assert!(prompt.contains("topic-05"));
        assert!(prompt.contains("topic-19"));
    }
}
