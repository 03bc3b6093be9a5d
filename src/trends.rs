//! Trending-topic source backed by the Google Trends daily trends feed.
//!
//! The feed is unofficial and frequently blocked, so [`TrendSource::fetch_trending`]
//! never fails: any fetch or parse problem is logged and the hardcoded
//! [`fallback_topics`] list is returned instead.
//!
//! # Response Shape
//!
//! The endpoint answers with an anti-XSSI prefix followed by JSON:
//!
//! ```text
//! )]}',
//! {"default": {"trendingSearchesDays": [{"trendingSearches": [
//!     {"title": {"query": "..."}, "formattedTraffic": "200K+", "relatedQueries": [{"query": "..."}]}
//! ]}]}}
//! ```

use rand::rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, read_success_body};
use crate::error::PipelineError;
use crate::models::{Topic, TrendingTopic};

/// Default daily trends endpoint.
pub const DAILY_TRENDS_URL: &str = "https://trends.google.com/trends/api/dailytrends";

/// Anything that can produce ranked topic candidates.
pub trait TrendSource {
    /// Candidates ranked most popular first. Never fails.
    async fn fetch_trending(&self) -> Vec<Topic>;
}

/// Region and endpoint settings for the trends feed.
#[derive(Debug, Clone)]
pub struct TrendsSettings {
    pub url: String,
    /// Region code, e.g. `KR`.
    pub geo: String,
    /// Interface language, e.g. `ko`.
    pub hl: String,
    pub timeout: Duration,
}

/// HTTP client for the daily trends feed.
#[derive(Debug, Clone)]
pub struct GoogleTrends {
    http: reqwest::Client,
    settings: TrendsSettings,
}

#[derive(Debug, Deserialize)]
struct DailyTrendsEnvelope {
    default: DailyTrends,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyTrends {
    trending_searches_days: Vec<TrendingDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendingDay {
    trending_searches: Vec<TrendingSearch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendingSearch {
    title: QueryText,
    formatted_traffic: Option<String>,
    #[serde(default)]
    related_queries: Vec<QueryText>,
}

#[derive(Debug, Deserialize)]
struct QueryText {
    query: String,
}

impl GoogleTrends {
    pub fn new(settings: TrendsSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent("Mozilla/5.0 (compatible; trend_post/0.1)")
            .build()?;
        Ok(Self { http, settings })
    }

    async fn fetch_raw(&self) -> Result<String, PipelineError> {
        let resp = self
            .http
            .get(&self.settings.url)
            .query(&[
                ("hl", self.settings.hl.as_str()),
                ("geo", self.settings.geo.as_str()),
                ("ns", "15"),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;
        read_success_body(resp)
            .await
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))
    }
}

impl TrendSource for GoogleTrends {
    #[instrument(level = "info", skip_all, fields(geo = %self.settings.geo))]
    async fn fetch_trending(&self) -> Vec<Topic> {
        info!("Fetching daily trending searches");
        let result = match self.fetch_raw().await {
            Ok(raw) => parse_daily_trends(&raw),
            Err(e) => Err(e),
        };

        match result {
            Ok(trends) => {
                info!(count = trends.len(), "Fetched trending searches");
                for t in &trends {
                    debug!(title = %t.title, traffic = ?t.traffic, "Trending search");
                }
                trends.into_iter().filter_map(TrendingTopic::into_topic).collect()
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Trend feed unavailable; using fallback topics");
                fallback_topics()
            }
        }
    }
}

/// Parse a daily trends payload (with or without its anti-XSSI prefix).
pub fn parse_daily_trends(raw: &str) -> Result<Vec<TrendingTopic>, PipelineError> {
    let start = raw
        .find('{')
        .ok_or_else(|| PipelineError::SourceUnavailable("response is not JSON".to_string()))?;
    let envelope: DailyTrendsEnvelope = serde_json::from_str(&raw[start..])
        .map_err(|e| PipelineError::SourceUnavailable(format!("unexpected response shape: {e}")))?;

    let day = envelope
        .default
        .trending_searches_days
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::SourceUnavailable("no trending days in response".to_string()))?;

    Ok(day
        .trending_searches
        .into_iter()
        .map(|s| TrendingTopic {
            title: s.title.query,
            traffic: s.formatted_traffic,
            related_queries: s.related_queries.into_iter().map(|q| q.query).collect(),
        })
        .collect())
}

/// Emergency topics used when the feed cannot be read, in random order.
pub fn fallback_topics() -> Vec<Topic> {
    let fixed: [(&str, &[&str]); 4] = [
        (
            "Semiconductor Market Outlook and Investment Strategy for 2026",
            &["Nvidia", "Samsung Electronics", "HBM memory"],
        ),
        (
            "How the Crypto Market Changed After Bitcoin ETF Approval",
            &["Ethereum", "altcoins", "asset allocation"],
        ),
        (
            "How Generative AI Is Redrawing the Map of Future Jobs",
            &["LLM", "automation", "workplace productivity"],
        ),
        (
            "Federal Reserve Rate Policy and Its Global Economic Impact",
            &["inflation", "exchange rates", "recession"],
        ),
    ];

    let mut topics: Vec<Topic> = fixed
        .iter()
        .filter_map(|(title, queries)| {
            Topic::new(title, queries.iter().map(|q| (*q).to_string()).collect())
        })
        .collect();
    topics.shuffle(&mut rng());
    topics
}
