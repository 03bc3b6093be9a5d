//! Featured image block.
//!
//! Images come from Picsum seeded by the topic title plus a random number, so
//! the same topic does not always get the same picture.

use html_escape::encode_double_quoted_attribute;
use rand::{Rng, rng};

/// Picsum seed URL for `title` with a given random suffix.
pub fn featured_image_url(title: &str, salt: u32) -> String {
    format!(
        "https://picsum.photos/seed/{}{}/1200/630",
        urlencoding::encode(title),
        salt
    )
}

/// Featured image markup for `title`.
pub fn featured_image_html(title: &str) -> String {
    let salt = rng().random_range(0..1000);
    image_block(&featured_image_url(title, salt), title)
}

fn image_block(url: &str, title: &str) -> String {
    format!(
        r#"<div style="margin-bottom: 40px; text-align: center;">
  <img src="{url}"
       alt="{alt}"
       style="width: 100%; max-width: 850px; height: auto; border-radius: 12px; box-shadow: 0 10px 30px rgba(0,0,0,0.15); border: 1px solid #eee;"
       loading="lazy"/>
  <p style="color: #666; font-size: 0.85em; margin-top: 15px; font-style: italic;">
    * Illustrative image to accompany the topic.
  </p>
</div>"#,
        url = encode_double_quoted_attribute(url),
        alt = encode_double_quoted_attribute(title),
    )
}
