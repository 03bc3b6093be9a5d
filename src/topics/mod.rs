//! Topic selection: candidate generation, duplicate judging and the bounded
//! selection loop that ties them together.
//!
//! # Submodules
//!
//! - [`generator`]: Asks the model for one fresh `{title, relatedQueries}` topic
//! - [`judge`]: Asks the model whether a candidate repeats a recent post
//! - [`selection`]: Tries trends first, then generated topics, at most five times

pub mod generator;
pub mod judge;
pub mod selection;

/// How many of the most recent titles are shown to the model.
pub const RECENT_TITLE_WINDOW: usize = 15;

/// The last `RECENT_TITLE_WINDOW` titles of a chronological history.
pub fn recent_titles(titles: &[String]) -> &[String] {
    let start = titles.len().saturating_sub(RECENT_TITLE_WINDOW);
    &titles[start..]
}
