//! The bounded topic-selection loop.
//!
//! ```text
//! START ─► TRY_TREND (attempt 1 only) ─► TRY_AI_GENERATE ─► CHECK_DUPLICATE ─┬─► SELECTED
//!   ▲                                                                          │
//!   └───────────────────────────────── RETRY ◄────────────────────────────────┤
//!                                                                              └─► EXHAUSTED
//! ```
//!
//! Trend candidates come first because they cost nothing and reflect real
//! demand. Each attempt produces at most one candidate; a rejected candidate is
//! dropped, never carried into the next attempt.

use tracing::{info, instrument, warn};

use crate::error::PipelineError;
use crate::models::{Selection, Topic, TopicOrigin};

/// Maximum number of attempts before selection gives up.
pub const MAX_ATTEMPTS: usize = 5;

/// Produces a fresh candidate topic, or `None` when it could not.
pub trait CandidateSource {
    /// `avoid` is the chronological list of already posted titles.
    async fn generate_candidate(&self, avoid: &[String]) -> Option<Topic>;
}

/// Decides whether a candidate repeats something already posted.
pub trait DuplicateCheck {
    async fn is_duplicate(&self, candidate: &str, posted: &[String]) -> bool;
}

/// Runs the selection loop over collaborators.
#[derive(Debug)]
pub struct TopicSelector<'a, G, J> {
    generator: &'a G,
    judge: &'a J,
    max_attempts: usize,
}

impl<'a, G, J> TopicSelector<'a, G, J>
where
    G: CandidateSource,
    J: DuplicateCheck,
{
    pub fn new(generator: &'a G, judge: &'a J) -> Self {
        Self {
            generator,
            judge,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    #[cfg(test)]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Pick one topic that is neither already posted nor judged a duplicate.
    ///
    /// `trends` is ranked most popular first; `posted` is read once by the
    /// caller and not refreshed during the loop.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SelectionExhausted`] when every attempt was spent.
    #[instrument(level = "info", skip_all, fields(trends = trends.len(), posted = posted.len()))]
    pub async fn select(
        &self,
        trends: &[Topic],
        posted: &[String],
    ) -> Result<Selection, PipelineError> {
        let mut attempt = 0usize;

        while attempt < self.max_attempts {
            attempt += 1;

            let mut candidate = None;
            if attempt == 1 {
                candidate = first_unused(trends, posted).map(|t| (t.clone(), TopicOrigin::Trend));
            }

            if candidate.is_none() {
                info!(attempt, max = self.max_attempts, "Asking the model for a new topic");
                candidate = self
                    .generator
                    .generate_candidate(posted)
                    .await
                    .map(|t| (t, TopicOrigin::Generated));
            }

            let Some((topic, origin)) = candidate else {
                warn!(attempt, "No candidate produced this attempt");
                continue;
            };

            if self.judge.is_duplicate(&topic.title, posted).await {
                warn!(attempt, title = %topic.title, "Rejected as duplicate topic");
                continue;
            }

            info!(attempt, title = %topic.title, ?origin, "Selected topic");
            return Ok(Selection {
                topic,
                attempts: attempt,
                origin,
            });
        }

        Err(PipelineError::SelectionExhausted { attempts: attempt })
    }
}

/// The highest-ranked trend whose title has not been posted (exact match).
pub fn first_unused<'t>(trends: &'t [Topic], posted: &[String]) -> Option<&'t Topic> {
    trends
        .iter()
        .find(|t| !posted.iter().any(|p| p == &t.title))
}
