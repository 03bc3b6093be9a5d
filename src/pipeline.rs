//! One end-to-end posting run.
//!
//! # Steps
//!
//! 1. **Selection**: fetch trends, read history once, run the selection loop
//! 2. **Rendering**: article, key facts, infographic, schema, featured image
//! 3. **Publishing**: submit to the blog, then record the topic in history
//!
//! In dry-run mode step 3 is replaced by logging what would have been posted.
//! History is only written after the blog accepted the post, so a failed
//! publish is never recorded as posted.

use chrono::Utc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::api::AskAsync;
use crate::blogger::Publisher;
use crate::error::PipelineError;
use crate::history::{DEFAULT_CATEGORY, DEFAULT_PILLAR, HistoryStore};
use crate::models::RunOutcome;
use crate::render::article::ArticleWriter;
use crate::render::document::{DocumentParts, assemble_document, build_labels};
use crate::render::facts::FactExtractor;
use crate::render::image::featured_image_html;
use crate::render::infographic::infographic_html;
use crate::render::schema::{DEFAULT_AUTHOR, DEFAULT_DESCRIPTION, article_schema, faq_schema};
use crate::topics::selection::{CandidateSource, DuplicateCheck, TopicSelector};
use crate::trends::TrendSource;

/// Collaborators of a run, borrowed for the lifetime of the process.
#[derive(Debug)]
pub struct Pipeline<'a, T, G, J, A, P> {
    pub trends: &'a T,
    pub history: &'a HistoryStore,
    pub generator: &'a G,
    pub judge: &'a J,
    pub writer: &'a ArticleWriter<A>,
    pub facts: &'a FactExtractor<A>,
    pub publisher: &'a P,
}

impl<'a, T, G, J, A, P> Pipeline<'a, T, G, J, A, P>
where
    T: TrendSource,
    G: CandidateSource,
    J: DuplicateCheck,
    A: AskAsync<Response = String>,
    P: Publisher,
{
    /// Run the whole pipeline once.
    ///
    /// # Errors
    ///
    /// Only run-ending errors are returned: selection exhaustion, article
    /// generation failure, publish failure and history I/O.
    #[instrument(level = "info", skip_all, fields(dry_run = dry_run))]
    pub async fn run(&self, dry_run: bool) -> Result<RunOutcome, PipelineError> {
        let t0 = Instant::now();
        info!("--- Pipeline run starting ---");

        // ---- Selection ----
        let trends = self.trends.fetch_trending().await;
        let posted = self.history.posted_titles().await?;
        info!(trends = trends.len(), posted = posted.len(), "Selection inputs ready");

        let selection = TopicSelector::new(self.generator, self.judge)
            .select(&trends, &posted)
            .await?;
        let topic = &selection.topic;
        info!(
            title = %topic.title,
            attempts = selection.attempts,
            origin = ?selection.origin,
            "Final topic selected"
        );

        // ---- Rendering ----
        let article = self.writer.generate_article(topic).await?;
        let facts = self.facts.extract_key_facts(&article.body).await;
        let infographic = infographic_html(facts.as_ref());
        let schema = article_schema(&topic.title, DEFAULT_DESCRIPTION, Utc::now(), DEFAULT_AUTHOR)
            + &faq_schema(&article.faqs);
        let image = featured_image_html(&topic.title);
        let html = assemble_document(&DocumentParts {
            schema: &schema,
            featured_image: &image,
            body: &article.body,
            infographic: &infographic,
        });

        if dry_run {
            info!("--- DRY RUN result ---");
            info!(title = %topic.title, tags = ?article.tags, bytes = html.len(), "Dry run; not publishing");
            return Ok(RunOutcome::DryRun {
                title: topic.title.clone(),
                tags: article.tags,
                html_len: html.len(),
            });
        }

        // ---- Publishing ----
        let labels = build_labels(&article.tags, &topic.title);
        let post = self.publisher.publish_post(&topic.title, &html, &labels).await?;
        self.history
            .append(&topic.title, DEFAULT_CATEGORY, DEFAULT_PILLAR)
            .await?;

        let elapsed = t0.elapsed();
        info!(
            post_id = %post.id,
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Pipeline run complete"
        );
        Ok(RunOutcome::Published {
            title: topic.title.clone(),
            post_id: post.id,
            attempts: selection.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedAsk;
    use crate::models::{PublishedPost, Topic};
    use crate::topics::generator::TopicGenerator;
    use crate::topics::judge::SimilarityJudge;
    use std::cell::RefCell;
    use tempfile::{TempDir, tempdir};

    struct FakeTrends(Vec<Topic>);

    impl TrendSource for FakeTrends {
        async fn fetch_trending(&self) -> Vec<Topic> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct FakePublisher {
        fail: bool,
        posts: RefCell<Vec<(String, String, Vec<String>)>>,
    }

    impl Publisher for FakePublisher {
        async fn publish_post(
            &self,
            title: &str,
            html: &str,
            labels: &[String],
        ) -> Result<PublishedPost, PipelineError> {
            if self.fail {
                return Err(PipelineError::PublishFailure("403 Forbidden".to_string()));
            }
            self.posts
                .borrow_mut()
                .push((title.to_string(), html.to_string(), labels.to_vec()));
            Ok(PublishedPost {
                id: "post-1".to_string(),
                url: None,
            })
        }
    }

    const ARTICLE: &str = r#"{"html": "<h1>B explained</h1><p>Body</p>", "tags": ["b", "explained"], "faqs": [{"question": "Why B?", "answer": "Because."}]}"#;
    const FACTS: &str = r#"{"headline": "B matters", "items": [{"label": "Why", "detail": "Because"}]}"#;

    struct Fixture {
        _dir: TempDir,
        history: HistoryStore,
        topic_ask: ScriptedAsk,
        judge_ask: ScriptedAsk,
        content_ask: ScriptedAsk,
        publisher: FakePublisher,
    }

    impl Fixture {
        async fn new(posted: &[&str], publish_fails: bool) -> Self {
            let dir = tempdir().unwrap();
            let history = HistoryStore::new(dir.path().join("clusters.json"));
            for title in posted {
                history.append(title, DEFAULT_CATEGORY, DEFAULT_PILLAR).await.unwrap();
            }
            Self {
                _dir: dir,
                history,
                topic_ask: ScriptedAsk::default(),
                judge_ask: ScriptedAsk::default(),
                content_ask: ScriptedAsk::new([Some(ARTICLE), Some(FACTS)]),
                publisher: FakePublisher {
                    fail: publish_fails,
                    ..FakePublisher::default()
                },
            }
        }

        async fn run(&self, trends: &[&str], dry_run: bool) -> Result<RunOutcome, PipelineError> {
            let trends = FakeTrends(trends.iter().filter_map(|t| Topic::new(t, vec![])).collect());
            let generator = TopicGenerator::new(&self.topic_ask, "English");
            let judge = SimilarityJudge::new(&self.judge_ask);
            let writer = ArticleWriter::new(&self.content_ask, "English");
            let facts = FactExtractor::new(&self.content_ask);
            let pipeline = Pipeline {
                trends: &trends,
                history: &self.history,
                generator: &generator,
                judge: &judge,
                writer: &writer,
                facts: &facts,
                publisher: &self.publisher,
            };
            pipeline.run(dry_run).await
        }
    }

    #[tokio::test]
    async fn test_publishes_unused_trend_and_records_it() {
        let mut fx = Fixture::new(&["A"], false).await;
        fx.judge_ask = ScriptedAsk::new([Some("[UNIQUE] different")]);

        let outcome = fx.run(&["A", "B"], false).await.unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Published {
                title: "B".to_string(),
                post_id: "post-1".to_string(),
                attempts: 1,
            }
        );
        assert_eq!(fx.topic_ask.calls(), 0);

        let posts = fx.publisher.posts.borrow();
        assert_eq!(posts.len(), 1);
        let (title, html, labels) = &posts[0];
        assert_eq!(title, "B");
        assert!(html.contains("<h1>B explained</h1>"));
        assert!(html.contains("B matters"));
        assert!(html.contains("application/ld+json"));
        assert!(html.contains("FAQPage"));
        assert_eq!(labels, &vec!["b".to_string(), "explained".to_string(), "Expert Insights".to_string(), "B".to_string()]);

        assert_eq!(fx.history.posted_titles().await.unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_exhausted_selection_publishes_nothing() {
        let fx = Fixture::new(&[], false).await;

        let err = fx.run(&[], false).await.unwrap_err();
        assert!(matches!(err, PipelineError::SelectionExhausted { attempts: 5 }));
        assert_eq!(fx.topic_ask.calls(), 5);
        assert_eq!(fx.content_ask.calls(), 0);
        assert!(fx.publisher.posts.borrow().is_empty());
        assert!(fx.history.posted_titles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_history_untouched() {
        let mut fx = Fixture::new(&["Old"], true).await;
        fx.topic_ask = ScriptedAsk::new([Some(r#"{"title": "X", "relatedQueries": ["a", "b"]}"#)]);
        fx.judge_ask = ScriptedAsk::new([Some("[UNIQUE]")]);

        let err = fx.run(&[], false).await.unwrap_err();
        assert!(matches!(err, PipelineError::PublishFailure(_)));
        assert_eq!(fx.history.posted_titles().await.unwrap(), vec!["Old"]);
    }

    #[tokio::test]
    async fn test_dry_run_skips_publish_and_history() {
        let fx = Fixture::new(&[], false).await;

        let outcome = fx.run(&["Fresh"], true).await.unwrap();
        match outcome {
            RunOutcome::DryRun { title, tags, html_len } => {
                assert_eq!(title, "Fresh");
                assert_eq!(tags, vec!["b", "explained"]);
                assert!(html_len > 0);
            }
            other => panic!("expected dry run, got {other:?}"),
        }
        assert_eq!(fx.judge_ask.calls(), 0);
        assert!(fx.publisher.posts.borrow().is_empty());
        assert!(fx.history.posted_titles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_article_failure_aborts_before_publish() {
        let mut fx = Fixture::new(&[], false).await;
        fx.content_ask = ScriptedAsk::new([Some("I'd rather not.")]);

        let err = fx.run(&["Fresh"], false).await.unwrap_err();
        assert!(matches!(err, PipelineError::ContentFailure(_)));
        assert!(fx.publisher.posts.borrow().is_empty());
        assert!(fx.history.posted_titles().await.unwrap().is_empty());
    }
}
