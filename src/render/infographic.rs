//! Summary card rendered from key facts.

use html_escape::encode_text;
use std::fmt::Write;

use crate::models::KeyFacts;

/// Shown in place of the table when no key facts are available.
pub const PLACEHOLDER: &str = "Key summary data is being prepared.";

/// Render the "at a glance" card for `facts`.
pub fn infographic_html(facts: Option<&KeyFacts>) -> String {
    let content = match facts {
        Some(facts) if !facts.items.is_empty() => facts_table(facts),
        _ => format!(r#"<p style="line-height: 1.6;">{}</p>"#, encode_text(PLACEHOLDER)),
    };

    format!(
        r#"<div style="background-color: #ffffff; border-radius: 12px; padding: 25px; margin: 30px 0; border: 1px solid #e1e4e8; box-shadow: 0 4px 6px rgba(0,0,0,0.05);">
  <div style="display: flex; align-items: center; margin-bottom: 15px;">
    <span style="font-size: 24px; margin-right: 10px;">📊</span>
    <h3 style="margin: 0; color: #1a1e21; font-size: 1.3em;">Key Points at a Glance</h3>
  </div>
  <p style="color: #6c757d; font-size: 0.9em; margin-bottom: 20px;">The core data of this post, summarized visually.</p>
  <div class="infographic-content" style="color: #333; text-align: left;">
{content}
  </div>
</div>"#
    )
}

fn facts_table(facts: &KeyFacts) -> String {
    let mut rows = String::new();
    for (idx, item) in facts.items.iter().enumerate() {
        let background = if idx % 2 == 0 { "#ffffff" } else { "#f8f9fa" };
        let label = if item.label.trim().is_empty() {
            "Info".to_string()
        } else {
            encode_text(item.label.trim()).into_owned()
        };
        let detail = encode_text(item.detail.trim()).replace('\n', "<br/>");
        // writing to a String cannot fail
        let _ = write!(
            rows,
            r#"
      <tr style="background-color: {background};">
        <td style="padding: 12px; border: 1px solid #dee2e6; font-weight: bold; color: #495057; width: 30%;">{label}</td>
        <td style="padding: 12px; border: 1px solid #dee2e6; line-height: 1.6;">{detail}</td>
      </tr>"#
        );
    }

    let headline = if facts.headline.is_empty() {
        "Analysis complete".to_string()
    } else {
        encode_text(&facts.headline).into_owned()
    };

    format!(
        r#"    <table style="width: 100%; border-collapse: collapse; margin-top: 15px; font-size: 0.95em;">
      <thead>
        <tr style="background-color: #007bff; color: white;">
          <th style="padding: 12px; text-align: left; border: 1px solid #dee2e6;">Item</th>
          <th style="padding: 12px; text-align: left; border: 1px solid #dee2e6;">Key Point</th>
        </tr>
      </thead>
      <tbody>{rows}
      </tbody>
    </table>
    <p style="margin-top: 15px; font-weight: bold; color: #007bff;">💡 Bottom line: {headline}</p>"#
    )
}
