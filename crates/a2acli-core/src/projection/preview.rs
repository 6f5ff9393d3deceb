//! Bounded previews of artifact parts.

use std::borrow::Cow;

use crate::protocol::Part;

/// How much of an artifact part to show inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewPolicy {
    /// Maximum number of characters kept before the marker.
    pub max_chars: usize,
    /// Appended when the preview was cut.
    pub marker: &'static str,
}

impl PreviewPolicy {
    /// Compact previews for the scrolling interactive log.
    pub const INTERACTIVE: Self = Self {
        max_chars: 200,
        marker: "...",
    };

    /// Longer previews for the one-shot task summary.
    pub const SUMMARY: Self = Self {
        max_chars: 500,
        marker: "... (truncated)",
    };

    /// Cut `text` to at most `max_chars` characters, appending the marker
    /// when anything was removed. Never splits a character.
    pub fn truncate<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match text.char_indices().nth(self.max_chars) {
            Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], self.marker)),
            None => Cow::Borrowed(text),
        }
    }

    /// Preview a single part. Structured data is pretty-printed first and
    /// the rendered text is what gets truncated.
    pub fn render(&self, part: &Part) -> Preview {
        match part {
            Part::Text { text } => Preview {
                label: "Content (Preview):",
                body: self.truncate(text).into_owned(),
                truncated: text.chars().count() > self.max_chars,
            },
            Part::Data { data } => {
                let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
                Preview {
                    label: "Data (Preview):",
                    truncated: pretty.chars().count() > self.max_chars,
                    body: self.truncate(&pretty).into_owned(),
                }
            }
        }
    }
}

impl Default for PreviewPolicy {
    fn default() -> Self {
        Self::INTERACTIVE
    }
}

/// A rendered part preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub label: &'static str,
    pub body: String,
    pub truncated: bool,
}

impl std::fmt::Display for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.label, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_text_is_untouched() {
        let p = PreviewPolicy::INTERACTIVE;
        assert!(matches!(p.truncate("hello"), Cow::Borrowed("hello")));
    }

    #[test]
    fn long_text_is_cut_with_marker() {
        let p = PreviewPolicy::INTERACTIVE;
        let text = "x".repeat(250);
        let cut = p.truncate(&text);
        assert_eq!(cut.len(), 203);
        assert!(cut.ends_with("..."));

        let exact = "y".repeat(200);
        assert_eq!(p.truncate(&exact), exact.as_str());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let p = PreviewPolicy {
            max_chars: 3,
            marker: "~",
        };
        assert_eq!(p.truncate("héllo wörld"), "hél~");
        assert_eq!(p.truncate("日本語テキスト"), "日本語~");
    }

    #[test]
    fn data_is_pretty_printed_before_truncation() {
        let p = PreviewPolicy::SUMMARY;
        let preview = p.render(&Part::data(json!({"a": 1})));
        assert_eq!(preview.label, "Data (Preview):");
        assert_eq!(preview.body, "{\n  \"a\": 1\n}");
        assert!(!preview.truncated);

        let big = json!({"rows": (0..400).collect::<Vec<_>>()});
        let preview = p.render(&Part::data(big));
        assert!(preview.truncated);
        assert!(preview.body.starts_with("{\n  \"rows\": [\n"));
        assert!(preview.body.ends_with("... (truncated)"));
    }

    #[test]
    fn display_puts_label_on_its_own_line() {
        let preview = PreviewPolicy::INTERACTIVE.render(&Part::text("hi"));
        assert_eq!(preview.to_string(), "Content (Preview):\nhi");
    }
}
