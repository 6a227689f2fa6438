use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Which side(s) of a paired line a word span belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenChange {
    Common,
    Removed,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordSpan {
    pub text: String,
    pub change: TokenChange,
}

impl WordSpan {
    /// True for spans that exist on only one side of the pair
    pub fn is_change(&self) -> bool {
        self.change != TokenChange::Common
    }
}

/// Word-level diff of one removed/added line pair.
///
/// Adjacent tokens with the same classification are merged into one span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WordDiff {
    spans: Vec<WordSpan>,
}

impl WordDiff {
    pub fn compute(removed: &str, added: &str) -> Self {
        let diff = TextDiff::from_words(removed, added);
        let mut spans: Vec<WordSpan> = Vec::new();

        for change in diff.iter_all_changes() {
            let kind = match change.tag() {
                ChangeTag::Equal => TokenChange::Common,
                ChangeTag::Delete => TokenChange::Removed,
                ChangeTag::Insert => TokenChange::Added,
            };
            match spans.last_mut() {
                Some(last) if last.change == kind => last.text.push_str(change.value()),
                _ => spans.push(WordSpan {
                    text: change.value().to_string(),
                    change: kind,
                }),
            }
        }

        Self { spans }
    }

    pub fn spans(&self) -> &[WordSpan] {
        &self.spans
    }

    /// Spans shown on the removed line: common and removed-only
    pub fn removed_view(&self) -> impl Iterator<Item = &WordSpan> {
        self.spans
            .iter()
            .filter(|span| span.change != TokenChange::Added)
    }

    /// Spans shown on the added line: common and added-only
    pub fn added_view(&self) -> impl Iterator<Item = &WordSpan> {
        self.spans
            .iter()
            .filter(|span| span.change != TokenChange::Removed)
    }

    pub fn has_changes(&self) -> bool {
        self.spans.iter().any(WordSpan::is_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed<'a>(spans: impl Iterator<Item = &'a WordSpan>) -> Vec<&'a str> {
        spans
            .filter(|span| span.is_change())
            .map(|span| span.text.as_str())
            .collect()
    }

    fn joined<'a>(spans: impl Iterator<Item = &'a WordSpan>) -> String {
        spans.map(|span| span.text.as_str()).collect()
    }

    #[test]
    fn test_single_word_replaced() {
        let diff = WordDiff::compute("hello world", "hello mars");

        assert_eq!(changed(diff.removed_view()), vec!["world"]);
        assert_eq!(changed(diff.added_view()), vec!["mars"]);
        assert!(diff.has_changes());
    }

    #[test]
    fn test_views_reconstruct_lines() {
        let removed = r#"  "version": "1.0.0","#;
        let added = r#"  "version": "2.0.0", "stable": true"#;
        let diff = WordDiff::compute(removed, added);

        assert_eq!(joined(diff.removed_view()), removed);
        assert_eq!(joined(diff.added_view()), added);
    }

    #[test]
    fn test_identical_lines_have_no_changes() {
        let diff = WordDiff::compute("same words here", "same words here");
        assert!(!diff.has_changes());
        assert_eq!(diff.spans().len(), 1);
        assert_eq!(diff.spans()[0].change, TokenChange::Common);
    }

    #[test]
    fn test_empty_sides() {
        let diff = WordDiff::compute("", "brand new");
        assert_eq!(joined(diff.added_view()), "brand new");
        assert_eq!(joined(diff.removed_view()), "");
        assert!(WordDiff::compute("", "").spans().is_empty());
    }
}
