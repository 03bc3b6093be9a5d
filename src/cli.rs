//! Command-line interface definitions for trend_post.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be provided through an environment variable (and
//! therefore through a `.env` file, which is loaded before parsing).

use clap::{Parser, Subcommand};

/// Command-line arguments for trend_post.
///
/// # Examples
///
/// ```sh
/// # Post once right now
/// trend_post run
///
/// # Select and render, but do not publish or record history
/// trend_post run --dry-run
///
/// # Long-running mode: post every day at 08:00 and 20:00
/// POSTING_HOUR=8,20 trend_post schedule
///
/// # One-off OAuth setup to obtain GOOGLE_REFRESH_TOKEN
/// trend_post auth
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run the pipeline once immediately (same as the `run` subcommand)
    #[arg(long, global = true)]
    pub now: bool,

    /// Select and render but skip publishing and history
    #[arg(long, global = true, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    pub gemini_model: String,

    /// Gemini API base URL
    #[arg(long, global = true, env = "GEMINI_BASE_URL", default_value = crate::api::GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Language the blog is written in
    #[arg(long, global = true, env = "CONTENT_LANGUAGE", default_value = "Korean")]
    pub language: String,

    /// Region code for trending searches
    #[arg(long, global = true, env = "TRENDS_GEO", default_value = "KR")]
    pub trends_geo: String,

    /// Interface language for trending searches
    #[arg(long, global = true, env = "TRENDS_HL", default_value = "ko")]
    pub trends_hl: String,

    /// Path of the JSON history file
    #[arg(long, global = true, env = "HISTORY_PATH", default_value = crate::history::DEFAULT_HISTORY_PATH)]
    pub history_path: String,

    /// Comma-separated hours (0-23, local time) at which to post
    #[arg(long, global = true, env = "POSTING_HOUR", default_value = "8")]
    pub posting_hours: String,

    /// Blogger blog ID
    #[arg(long, global = true, env = "BLOGGER_ID")]
    pub blog_id: Option<String>,

    /// Google OAuth client ID
    #[arg(long, global = true, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// Google OAuth client secret
    #[arg(long, global = true, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub google_client_secret: Option<String>,

    /// Google OAuth refresh token
    #[arg(long, global = true, env = "GOOGLE_REFRESH_TOKEN", hide_env_values = true)]
    pub google_refresh_token: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true, env = "HTTP_TIMEOUT_SECS", default_value_t = 120)]
    pub http_timeout_secs: u64,

    /// Directory for the rotating log file; empty disables file logging
    #[arg(long, global = true, env = "LOG_DIR", default_value = "logs")]
    pub log_dir: String,

    /// Retries for each model call before it counts as failed
    #[arg(long, global = true, env = "LLM_RETRIES", default_value_t = 2)]
    pub llm_retries: usize,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the pipeline once and exit (0 on success, 1 on failure)
    Run,
    /// Run at the configured posting hours until interrupted (default)
    Schedule,
    /// Interactive OAuth flow that prints a refresh token
    Auth,
    /// List the models available to the Gemini API key
    Models,
}

impl Cli {
    /// The command to execute, resolving `--now` and the default.
    pub fn resolved_command(&self) -> Command {
        match (&self.command, self.now) {
            (Some(cmd), _) => cmd.clone(),
            (None, true) => Command::Run,
            (None, false) => Command::Schedule,
        }
    }
}

#[cfg(test)]
impl Cli {
    /// Parse `args` with every `env` fallback switched off, so results do not
    /// depend on the variables exported in the calling shell.
    pub(crate) fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        use clap::{CommandFactory, FromArgMatches};

        let matches = Self::command()
            .mut_args(|arg| arg.env(None::<&str>))
            .try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_args(["trend_post"]).unwrap();
        assert_eq!(cli.resolved_command(), Command::Schedule);
        assert_eq!(cli.history_path, "data/clusters.json");
        assert_eq!(cli.http_timeout_secs, 120);
        assert_eq!(cli.posting_hours, "8");
        assert_eq!(cli.log_dir, "logs");
        assert!(!cli.dry_run);
        assert!(cli.gemini_api_key.is_none());
    }

    #[test]
    fn test_cli_env_fallbacks_are_declared() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let env_of = |id: &str| {
            cmd.get_arguments()
                .find(|a| a.get_id() == id)
                .and_then(|a| a.get_env())
                .map(|e| e.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("posting_hours").as_deref(), Some("POSTING_HOUR"));
        assert_eq!(env_of("google_refresh_token").as_deref(), Some("GOOGLE_REFRESH_TOKEN"));
        assert_eq!(env_of("dry_run").as_deref(), Some("DRY_RUN"));
    }

    #[test]
    fn test_cli_now_flag() {
        let cli = Cli::try_parse_args(["trend_post", "--now", "--dry-run"]).unwrap();
        assert_eq!(cli.resolved_command(), Command::Run);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_cli_subcommand_with_global_flags() {
        let cli = Cli::try_parse_args([
            "trend_post",
            "run",
            "--dry-run",
            "--posting-hours",
            "8,20",
            "--gemini-model",
            "gemini-2.5-pro",
        ])
        .unwrap();

        assert_eq!(cli.resolved_command(), Command::Run);
        assert!(cli.dry_run);
        assert_eq!(cli.posting_hours, "8,20");
        assert_eq!(cli.gemini_model, "gemini-2.5-pro");
    }

    #[test]
    fn test_cli_auth_subcommand() {
        let cli = Cli::try_parse_args(["trend_post", "auth", "--google-client-id", "abc"]).unwrap();
        assert_eq!(cli.resolved_command(), Command::Auth);
        assert_eq!(cli.google_client_id.as_deref(), Some("abc"));
    }
}
