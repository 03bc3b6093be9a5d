//! # trend_post
//!
//! An automated blog poster that picks a trending topic it has not written
//! about before, has an LLM write an article about it and publishes the result
//! to a Blogger blog, once per configured posting hour.
//!
//! ## Features
//!
//! - Pulls the day's trending searches for a region, with a built-in fallback
//!   list when the feed is unavailable
//! - Generates fresh candidate topics with Gemini when every trend was covered
//! - Rejects near-duplicates of past posts with an LLM similarity judge
//! - Renders a full HTML post: article body, key-facts table, JSON-LD schema
//!   and a featured image
//! - Publishes through the Blogger v3 API using an OAuth refresh token
//! - Keeps a JSON history of everything posted
//! - Logs to the console and to a daily-rotated file under `LOG_DIR`
//!
//! ## Usage
//!
//! ```sh
//! trend_post run --dry-run      # one run, nothing published
//! trend_post run                # one run, exit code 1 on failure
//! trend_post                    # schedule at POSTING_HOUR until Ctrl-C
//! trend_post auth               # obtain GOOGLE_REFRESH_TOKEN
//! trend_post models             # list models for GEMINI_API_KEY
//! ```
//!
//! ## Architecture
//!
//! Every run follows the same pipeline:
//! 1. **Selection**: trends, then generated candidates, checked against history
//! 2. **Rendering**: article, key facts, infographic, schema, featured image
//! 3. **Publishing**: Blogger insert, then a history record

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, info};

mod api;
mod auth;
mod blogger;
mod cli;
mod config;
mod error;
mod history;
mod logging;
mod models;
mod pipeline;
mod render;
mod scheduler;
mod topics;
mod trends;
mod utils;

use api::{GeminiClient, RetryAsk};
use auth::run_bootstrap;
use blogger::BloggerClient;
use cli::{Cli, Command};
use config::{Config, LLM_RETRY_BASE_DELAY};
use history::HistoryStore;
use pipeline::Pipeline;
use render::article::ArticleWriter;
use render::facts::FactExtractor;
use scheduler::{Trigger, report_outcome, run_schedule};
use topics::generator::TopicGenerator;
use topics::judge::SimilarityJudge;
use trends::GoogleTrends;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let command = args.resolved_command();
    let config = Config::from_cli(&args)?;

    // --- Tracing init ---
    let _log_guard = logging::init(config.log_dir.as_deref())?;
    debug!(?command, ?config, "Parsed CLI arguments");

    match command {
        Command::Auth => {
            run_bootstrap(&config.oauth()?).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Models => {
            let client = GeminiClient::new(config.gemini()?)?;
            for name in client.list_models().await? {
                println!("{name}");
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Run | Command::Schedule => {}
    }

    // --- Collaborators ---
    let gemini = GeminiClient::new(config.gemini()?)?;
    info!(model = gemini.model(), dry_run = config.dry_run, "trend_post starting up");
    let llm = RetryAsk::new(gemini, config.llm_retries, LLM_RETRY_BASE_DELAY);

    let trends = GoogleTrends::new(config.trends())?;
    let history = HistoryStore::new(config.history_path.clone());
    let generator = TopicGenerator::new(&llm, &config.language);
    let judge = SimilarityJudge::new(&llm);
    let writer = ArticleWriter::new(&llm, &config.language);
    let facts = FactExtractor::new(&llm);
    let publisher = config.blogger()?.map(BloggerClient::new).transpose()?;

    // Creates the seeded file on first start.
    let existing = history.load().await?;
    info!(
        path = %history.path().display(),
        posted = existing.history.len(),
        "History loaded"
    );

    let pipeline = Pipeline {
        trends: &trends,
        history: &history,
        generator: &generator,
        judge: &judge,
        writer: &writer,
        facts: &facts,
        publisher: &publisher,
    };

    if command == Command::Run {
        let outcome = pipeline.run(config.dry_run).await;
        return Ok(if report_outcome(Trigger::Manual, &outcome) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    run_schedule(&config.posting_hours, || pipeline.run(config.dry_run)).await;
    info!("trend_post shut down");
    Ok(ExitCode::SUCCESS)
}
