//! schema.org JSON-LD markup embedded at the top of each post.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::models::Faq;

/// Author name written into the Article markup.
pub const DEFAULT_AUTHOR: &str = "Knowledge Bot";

/// Description used for pipeline posts.
pub const DEFAULT_DESCRIPTION: &str = "In-depth expert analysis";

/// `Article` markup for a post.
pub fn article_schema(title: &str, description: &str, published: DateTime<Utc>, author: &str) -> String {
    let schema = json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": title,
        "description": description,
        "datePublished": published.to_rfc3339_opts(SecondsFormat::Millis, true),
        "author": {
            "@type": "Person",
            "name": author,
        },
    });
    script_tag(&schema)
}

/// `FAQPage` markup, or an empty string when there are no questions.
pub fn faq_schema(faqs: &[Faq]) -> String {
    if faqs.is_empty() {
        return String::new();
    }
    let entities: Vec<_> = faqs
        .iter()
        .map(|faq| {
            json!({
                "@type": "Question",
                "name": faq.question,
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": faq.answer,
                },
            })
        })
        .collect();
    let schema = json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": entities,
    });
    script_tag(&schema)
}

fn script_tag(schema: &serde_json::Value) -> String {
    // "</" inside a JSON string would close the script element early
    let body = schema.to_string().replace("</", "<\\/");
    format!(r#"<script type="application/ld+json">{body}</script>"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(tag: &str) -> serde_json::Value {
        let start = tag.find('>').unwrap() + 1;
        let end = tag.rfind("</script>").unwrap();
        serde_json::from_str(&tag[start..end]).unwrap()
    }

    #[test]
    fn test_article_schema_fields() {
        let published = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();
        let tag = article_schema("Rust \"fast\"", DEFAULT_DESCRIPTION, published, DEFAULT_AUTHOR);
        assert!(tag.starts_with(r#"<script type="application/ld+json">"#));

        let v = payload(&tag);
        assert_eq!(v["@type"], "Article");
        assert_eq!(v["headline"], "Rust \"fast\"");
        assert_eq!(v["datePublished"], "2026-10-18T08:00:00.000Z");
        assert_eq!(v["author"]["name"], DEFAULT_AUTHOR);
    }

    #[test]
    fn test_script_close_is_escaped() {
        let published = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let tag = article_schema("</script><b>", "d", published, "a");
        assert_eq!(tag.matches("</script>").count(), 1);
        assert_eq!(payload(&tag)["headline"], "</script><b>");
    }

    #[test]
    fn test_faq_schema() {
        assert_eq!(faq_schema(&[]), "");

        let tag = faq_schema(&[Faq {
            question: "What is HBM?".to_string(),
            answer: "High bandwidth memory.".to_string(),
        }]);
        let v = payload(&tag);
        assert_eq!(v["@type"], "FAQPage");
        assert_eq!(v["mainEntity"][0]["name"], "What is HBM?");
        assert_eq!(v["mainEntity"][0]["acceptedAnswer"]["text"], "High bandwidth memory.");
    }
}
