use crate::types::Color;
use serde_json::Value;

/// Formatting applied to a text run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

/// The content variant of a text run.
///
/// Each variant carries its own data: a mention always has a payload and
/// an equation always has an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextKind {
    Text { content: String, link: Option<String> },
    /// `mention_type` is the wire tag (`user`, `page`, `date`, ...) and
    /// `payload` the object stored under it, kept as delivered.
    Mention { mention_type: String, payload: Value },
    Equation { expression: String },
}

/// One segment of a rich text value.
#[derive(Debug, Clone, PartialEq)]
pub struct RichTextRun {
    pub kind: RichTextKind,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
}

impl RichTextRun {
    /// An unannotated text run.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: RichTextKind::Text {
                content: text.clone(),
                link: None,
            },
            annotations: Annotations::default(),
            plain_text: text,
            href: None,
        }
    }

    /// A text run that links to `url`.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        let text = text.into();
        let url = url.into();
        Self {
            kind: RichTextKind::Text {
                content: text.clone(),
                link: Some(url.clone()),
            },
            annotations: Annotations::default(),
            plain_text: text,
            href: Some(url),
        }
    }
}

/// An ordered sequence of text runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichText(Vec<RichTextRun>);

impl RichText {
    pub fn new(runs: Vec<RichTextRun>) -> Self {
        Self(runs)
    }

    /// A single unannotated run, or no runs at all for an empty string.
    pub fn plain(text: &str) -> Self {
        if text.is_empty() {
            Self::default()
        } else {
            Self(vec![RichTextRun::plain(text)])
        }
    }

    pub fn runs(&self) -> &[RichTextRun] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The flattened string: every run's plain text, concatenated in order.
    pub fn plain_text(&self) -> String {
        self.0.iter().map(|run| run.plain_text.as_str()).collect()
    }

    pub fn extend(&mut self, other: RichText) {
        self.0.extend(other.0);
    }
}

impl From<Vec<RichTextRun>> for RichText {
    fn from(runs: Vec<RichTextRun>) -> Self {
        Self(runs)
    }
}

impl FromIterator<RichTextRun> for RichText {
    fn from_iter<I: IntoIterator<Item = RichTextRun>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_concatenates_runs_in_order() {
        let text = RichText::new(vec![
            RichTextRun::plain("Hello, "),
            RichTextRun::link("world", "https://example.com"),
            RichTextRun::plain("!"),
        ]);
        assert_eq!(text.plain_text(), "Hello, world!");
        assert_eq!(text.len(), 3);
    }

    #[test]
    fn empty_plain_has_no_runs() {
        assert!(RichText::plain("").is_empty());
    }
}
