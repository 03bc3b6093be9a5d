//! Turning a selected topic into a publishable HTML document.
//!
//! # Submodules
//!
//! - [`article`]: Asks the model for the article body and its tags
//! - [`facts`]: Asks the model for a few key facts about the article
//! - [`infographic`]: Renders key facts as a summary card with a table
//! - [`schema`]: schema.org JSON-LD markup for search engines
//! - [`image`]: Featured image block
//! - [`document`]: Assembles everything into one HTML document and builds labels
//!
//! Only [`article`] and [`facts`] talk to the model; the rest are pure
//! functions of their inputs (the image seed aside).

pub mod article;
pub mod document;
pub mod facts;
pub mod image;
pub mod infographic;
pub mod schema;
