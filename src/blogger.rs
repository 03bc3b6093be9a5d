//! Publishing posts through the Blogger v3 API.

use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::api::{ApiError, read_success_body};
use crate::auth::{OAuthClient, refresh_access_token};
use crate::error::PipelineError;
use crate::models::PublishedPost;

pub const BLOGGER_API_URL: &str = "https://www.googleapis.com/blogger/v3";

/// Anything that can publish a post.
pub trait Publisher {
    /// Publish `html` under `title` with `labels`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::PublishFailure`] when the post was not accepted.
    async fn publish_post(
        &self,
        title: &str,
        html: &str,
        labels: &[String],
    ) -> Result<PublishedPost, PipelineError>;
}

/// Blogger connection settings.
#[derive(Clone)]
pub struct BloggerSettings {
    pub api_url: String,
    pub blog_id: String,
    pub oauth: OAuthClient,
    pub refresh_token: String,
    pub timeout: Duration,
}

impl fmt::Debug for BloggerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloggerSettings")
            .field("api_url", &self.api_url)
            .field("blog_id", &self.blog_id)
            .field("oauth", &self.oauth)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Blogger API client.
#[derive(Debug, Clone)]
pub struct BloggerClient {
    http: reqwest::Client,
    settings: BloggerSettings,
}

impl BloggerClient {
    pub fn new(settings: BloggerSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    fn posts_url(&self) -> String {
        format!(
            "{}/blogs/{}/posts/",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.blog_id
        )
    }

    async fn insert(&self, title: &str, html: &str, labels: &[String]) -> Result<PublishedPost, ApiError> {
        let token = refresh_access_token(&self.http, &self.settings.oauth, &self.settings.refresh_token).await?;
        debug!(expires_in = ?token.expires_in, "Access token refreshed");
        let body = json!({
            "kind": "blogger#post",
            "title": title,
            "content": html,
            "labels": labels,
        });

        let resp = self
            .http
            .post(self.posts_url())
            .bearer_auth(&token.access_token)
            .json(&body)
            .send()
            .await?;
        let raw = read_success_body(resp).await?;
        serde_json::from_str(&raw).map_err(|e| ApiError::Response(format!("post response: {e}")))
    }
}

impl Publisher for BloggerClient {
    #[instrument(level = "info", skip_all, fields(%title, blog_id = %self.settings.blog_id))]
    async fn publish_post(
        &self,
        title: &str,
        html: &str,
        labels: &[String],
    ) -> Result<PublishedPost, PipelineError> {
        info!(labels = ?labels, bytes = html.len(), "Publishing post to Blogger");
        match self.insert(title, html, labels).await {
            Ok(post) => {
                info!(post_id = %post.id, url = ?post.url, "Post published");
                Ok(post)
            }
            Err(e) => {
                error!(error = %e, "Blogger publish failed");
                Err(PipelineError::PublishFailure(e.to_string()))
            }
        }
    }
}

/// An unconfigured blog refuses every post.
impl Publisher for Option<BloggerClient> {
    async fn publish_post(
        &self,
        title: &str,
        html: &str,
        labels: &[String],
    ) -> Result<PublishedPost, PipelineError> {
        match self {
            Some(client) => client.publish_post(title, html, labels).await,
            None => Err(PipelineError::PublishFailure(
                "Blogger is not configured".to_string(),
            )),
        }
    }
}
