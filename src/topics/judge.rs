//! Semantic duplicate check against recently posted topics.
//!
//! A literal string comparison misses reframed repeats ("Fed rate cut" vs
//! "What the Fed's rate decision means"), so the model is asked instead. If
//! the model cannot be reached the candidate is treated as new: an outage of
//! the judge must not stop the blog from posting.

use tracing::{debug, info, instrument, warn};

use crate::api::AskAsync;
use crate::error::PipelineError;
use crate::topics::recent_titles;
use crate::topics::selection::DuplicateCheck;
use crate::utils::truncate_for_log;

/// Marker the model must emit for a duplicate.
pub const DUPLICATE_MARKER: &str = "[DUPLICATE]";

/// Marker the model must emit for a new topic.
pub const UNIQUE_MARKER: &str = "[UNIQUE]";

/// Judges candidates through the completion service.
#[derive(Debug)]
pub struct SimilarityJudge<A> {
    ask: A,
}

impl<A> SimilarityJudge<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(ask: A) -> Self {
        Self { ask }
    }

    fn prompt(candidate: &str, recent: &[String]) -> String {
        let listed = recent
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {t}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You decide whether a new blog topic repeats one that was already published.

Previously published topics:
{listed}

New topic: "{candidate}"

If the new topic covers materially the same subject as any previous topic, even when worded differently, answer with {DUPLICATE_MARKER}.
Otherwise answer with {UNIQUE_MARKER}.
Start your answer with the marker, then give a one-sentence reason."#
        )
    }
}

impl<A> DuplicateCheck for SimilarityJudge<A>
where
    A: AskAsync<Response = String>,
{
    #[instrument(level = "info", skip_all, fields(candidate = %candidate))]
    async fn is_duplicate(&self, candidate: &str, posted: &[String]) -> bool {
        if posted.is_empty() {
            debug!("No history yet; skipping similarity check");
            return false;
        }

        let prompt = Self::prompt(candidate, recent_titles(posted));
        match self.ask.ask(&prompt).await {
            Ok(reply) => {
                let duplicate = has_duplicate_marker(&reply);
                info!(
                    duplicate,
                    reply = %truncate_for_log(reply.trim(), 200),
                    "Similarity verdict"
                );
                duplicate
            }
            Err(e) => {
                let e = PipelineError::JudgeUnavailable(e.to_string());
                warn!(error = %e, kind = e.kind(), "Similarity check failed; treating topic as new");
                false
            }
        }
    }
}

/// Whether a judge reply opens with the duplicate marker.
///
/// Only the leading bracketed token counts; markers quoted later in the
/// reason are ignored. Markdown emphasis around the marker is tolerated.
pub fn has_duplicate_marker(reply: &str) -> bool {
    leading_marker(reply).is_some_and(|m| m.eq_ignore_ascii_case(DUPLICATE_MARKER))
}

fn leading_marker(reply: &str) -> Option<&str> {
    let rest = reply.trim_start().trim_start_matches(['*', '_', '`']);
    if !rest.starts_with('[') {
        return None;
    }
    rest.find(']').map(|end| &rest[..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedAsk;

    fn titles(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_has_duplicate_marker() {
        assert!(has_duplicate_marker("[DUPLICATE] Same subject as #3."));
        assert!(has_duplicate_marker("  [duplicate] - same thing"));
        assert!(has_duplicate_marker("**[DUPLICATE]** same thing"));
        assert!(!has_duplicate_marker("[UNIQUE] Not a duplicate of anything."));
        assert!(!has_duplicate_marker("Verdict: [DUPLICATE]"));
        assert!(!has_duplicate_marker("DUPLICATE without brackets is not the marker"));
        assert!(!has_duplicate_marker(""));
    }

    #[test]
    fn test_later_marker_mention_is_ignored() {
        assert!(!has_duplicate_marker(
            "[UNIQUE] This is not a [DUPLICATE] of any earlier post."
        ));
    }

    #[tokio::test]
    async fn test_empty_history_makes_no_call() {
        let ask = ScriptedAsk::new([Some("[DUPLICATE]")]);
        let judge = SimilarityJudge::new(&ask);

        assert!(!judge.is_duplicate("Anything", &[]).await);
        assert_eq!(ask.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_verdict() {
        let ask = ScriptedAsk::new([Some("[DUPLICATE] Both are about the Fed.")]);
        let judge = SimilarityJudge::new(&ask);

        assert!(judge.is_duplicate("Fed rate decision", &titles(&["Fed rate cut"])).await);
        assert_eq!(ask.calls(), 1);
        let prompt = ask.prompts.borrow()[0].clone();
        assert!(prompt.contains("1. Fed rate cut"));
        assert!(prompt.contains("\"Fed rate decision\""));
    }

    #[tokio::test]
    async fn test_unique_verdict() {
        let ask = ScriptedAsk::new([Some("[UNIQUE] Different subject.")]);
        let judge = SimilarityJudge::new(&ask);
        assert!(!judge.is_duplicate("Solar panels", &titles(&["Bitcoin ETF"])).await);
    }

    #[tokio::test]
    async fn test_unique_verdict_quoting_duplicate_marker() {
        let ask = ScriptedAsk::new([Some("[UNIQUE] This is not a [DUPLICATE] of any earlier post.")]);
        let judge = SimilarityJudge::new(&ask);
        assert!(!judge.is_duplicate("Solar panels", &titles(&["Bitcoin ETF"])).await);
    }

    #[tokio::test]
    async fn test_failure_fails_open() {
        let ask = ScriptedAsk::new([None::<String>]);
        let judge = SimilarityJudge::new(&ask);
        assert!(!judge.is_duplicate("Solar panels", &titles(&["Solar panels"])).await);
        assert_eq!(ask.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_limits_history_window() {
        let ask = ScriptedAsk::new([Some("[UNIQUE]")]);
        let judge = SimilarityJudge::new(&ask);
        let posted: Vec<String> = (0..30).map(|i| format!("post-{i:02}")).collect();

        judge.is_duplicate("New", &posted).await;
        let prompt = ask.prompts.borrow()[0].clone();
        assert!(!prompt.contains("post-14"));
        assert!(prompt.contains("post-15"));
        assert!(prompt.contains("15. post-29"));
    }
}
