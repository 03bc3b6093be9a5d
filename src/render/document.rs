//! Final document assembly and post labels.

use itertools::Itertools;

use crate::utils::take_chars;

/// Label attached to every post.
pub const FIXED_LABEL: &str = "Expert Insights";

/// How many leading characters of the title become a label.
const TITLE_LABEL_CHARS: usize = 15;

const STYLE: &str = r#"<style>
  .blog-content h1 { margin-bottom: 30px; line-height: 1.4; color: #1a1e21; }
  .blog-content h2 { margin-top: 40px; margin-bottom: 20px; color: #343a40; border-bottom: 2px solid #f1f3f5; padding-bottom: 10px; }
  .blog-content h3 { margin-top: 30px; margin-bottom: 15px; color: #495057; }
  .blog-content p { line-height: 1.8; margin-bottom: 20px; color: #212529; font-size: 1.05em; }
  .blog-content ul, .blog-content ol { margin-bottom: 20px; padding-left: 20px; }
  .blog-content li { margin-bottom: 10px; line-height: 1.6; }
</style>"#;

const FOOTER: &str = "This post was written through expert analysis based on real-time information.";

/// The rendered pieces of one post.
#[derive(Debug, Clone)]
pub struct DocumentParts<'a> {
    pub schema: &'a str,
    pub featured_image: &'a str,
    pub body: &'a str,
    pub infographic: &'a str,
}

/// Assemble the HTML submitted to the blog.
pub fn assemble_document(parts: &DocumentParts<'_>) -> String {
    format!(
        r#"{STYLE}
<div class="blog-content">
{schema}
{image}
{body}
<hr style="margin: 50px 0; border: 0; border-top: 1px solid #eee;"/>
{infographic}
<p style="color: gray; font-size: 0.8em; margin-top: 30px; text-align: center;">
  {FOOTER}
</p>
</div>"#,
        schema = parts.schema,
        image = parts.featured_image,
        body = parts.body,
        infographic = parts.infographic,
    )
}

/// Labels for a post: article tags, the fixed label, then the head of the title.
///
/// Duplicates are removed keeping first occurrence.
pub fn build_labels(tags: &[String], title: &str) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_string())
        .chain([
            FIXED_LABEL.to_string(),
            take_chars(title, TITLE_LABEL_CHARS).trim().to_string(),
        ])
        .filter(|l| !l.is_empty())
        .unique()
        .collect()
}
