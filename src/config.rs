//! Runtime configuration resolved from the command line and environment.
//!
//! Each collaborator gets its own settings accessor so that a mode only
//! requires the keys it actually uses: `auth` never needs the Gemini key and
//! a dry run never needs Blogger credentials.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::GeminiSettings;
use crate::auth::{OAuthClient, TOKEN_URL};
use crate::blogger::{BLOGGER_API_URL, BloggerSettings};
use crate::cli::Cli;
use crate::error::PipelineError;
use crate::scheduler::parse_posting_hours;
use crate::trends::{DAILY_TRENDS_URL, TrendsSettings};

const GEMINI_TEMPERATURE: f32 = 0.7;

/// Base delay of the model retry backoff.
pub const LLM_RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct Config {
    pub dry_run: bool,
    pub language: String,
    pub history_path: PathBuf,
    /// `None` keeps logs on the console only.
    pub log_dir: Option<PathBuf>,
    pub posting_hours: Vec<u32>,
    pub llm_retries: usize,
    pub timeout: Duration,
    gemini_api_key: Option<String>,
    gemini_model: String,
    gemini_base_url: String,
    trends_geo: String,
    trends_hl: String,
    blog_id: Option<String>,
    google_client_id: Option<String>,
    google_client_secret: Option<String>,
    google_refresh_token: Option<String>,
}

impl Config {
    /// Resolve the configuration, validating the values every mode shares.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] when `POSTING_HOUR` is malformed.
    pub fn from_cli(cli: &Cli) -> Result<Self, PipelineError> {
        Ok(Self {
            dry_run: cli.dry_run,
            language: cli.language.trim().to_string(),
            history_path: PathBuf::from(&cli.history_path),
            log_dir: Some(cli.log_dir.trim())
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            posting_hours: parse_posting_hours(&cli.posting_hours)?,
            llm_retries: cli.llm_retries,
            timeout: Duration::from_secs(cli.http_timeout_secs.max(1)),
            gemini_api_key: non_empty(&cli.gemini_api_key),
            gemini_model: cli.gemini_model.trim().to_string(),
            gemini_base_url: cli.gemini_base_url.clone(),
            trends_geo: cli.trends_geo.trim().to_string(),
            trends_hl: cli.trends_hl.trim().to_string(),
            blog_id: non_empty(&cli.blog_id),
            google_client_id: non_empty(&cli.google_client_id),
            google_client_secret: non_empty(&cli.google_client_secret),
            google_refresh_token: non_empty(&cli.google_refresh_token),
        })
    }

    pub fn gemini(&self) -> Result<GeminiSettings, PipelineError> {
        Ok(GeminiSettings {
            api_key: required(&self.gemini_api_key, "GEMINI_API_KEY")?,
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            timeout: self.timeout,
            temperature: GEMINI_TEMPERATURE,
        })
    }

    pub fn trends(&self) -> TrendsSettings {
        TrendsSettings {
            url: DAILY_TRENDS_URL.to_string(),
            geo: self.trends_geo.clone(),
            hl: self.trends_hl.clone(),
            timeout: self.timeout,
        }
    }

    pub fn oauth(&self) -> Result<OAuthClient, PipelineError> {
        Ok(OAuthClient {
            client_id: required(&self.google_client_id, "GOOGLE_CLIENT_ID")?,
            client_secret: required(&self.google_client_secret, "GOOGLE_CLIENT_SECRET")?,
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Blogger settings, or `None` in dry-run mode where nothing is published.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] naming the first missing credential.
    pub fn blogger(&self) -> Result<Option<BloggerSettings>, PipelineError> {
        if self.dry_run {
            return Ok(None);
        }
        Ok(Some(BloggerSettings {
            api_url: BLOGGER_API_URL.to_string(),
            blog_id: required(&self.blog_id, "BLOGGER_ID")?,
            oauth: self.oauth()?,
            refresh_token: required(&self.google_refresh_token, "GOOGLE_REFRESH_TOKEN")?,
            timeout: self.timeout,
        }))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dry_run", &self.dry_run)
            .field("language", &self.language)
            .field("history_path", &self.history_path)
            .field("log_dir", &self.log_dir)
            .field("posting_hours", &self.posting_hours)
            .field("gemini_model", &self.gemini_model)
            .field("trends_geo", &self.trends_geo)
            .field("blog_id", &self.blog_id)
            .field("has_gemini_key", &self.gemini_api_key.is_some())
            .field("has_refresh_token", &self.google_refresh_token.is_some())
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(value: &Option<String>, name: &str) -> Result<String, PipelineError> {
    value
        .clone()
        .ok_or_else(|| PipelineError::Config(format!("{name} is not set")))
}
