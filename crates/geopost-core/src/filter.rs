//! Deny-list content filter applied to search results.

use serde::{Deserialize, Serialize};

/// Words excluded from search results unless configured otherwise
pub const DEFAULT_DENY_LIST: &[&str] = &["fuck", "dick", "ass"];

/// Case-sensitive substring deny-list
///
/// A match anywhere in the text excludes it; there is no word-boundary
/// handling, so "ass" also matches "class".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    words: Vec<String>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_LIST.iter().copied())
    }
}

impl ContentFilter {
    /// Build a filter from a deny-list; empty entries are dropped since they would match everything
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).filter(|w| !w.is_empty()).collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True if `text` contains any deny-listed substring
    pub fn is_filtered(&self, text: &str) -> bool {
        self.words.iter().any(|word| text.contains(word.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_filter_examples() {
        let filter = ContentFilter::default();
        assert!(filter.is_filtered("what the fuck"));
        assert!(!filter.is_filtered("hello world"));
    }

    #[test]
    fn test_substring_not_word_match() {
        let filter = ContentFilter::default();
        assert!(filter.is_filtered("first class seats"));
        assert!(filter.is_filtered("dickens"));
    }

    #[test]
    fn test_case_sensitive() {
        let filter = ContentFilter::default();
        assert!(!filter.is_filtered("FUCK"));
        assert!(!filter.is_filtered("Ass"));
    }

    #[test]
    fn test_empty_entries_ignored() {
        let filter = ContentFilter::new(["", "spam"]);
        assert_eq!(filter.words(), &["spam".to_string()]);
        assert!(!filter.is_filtered("hello"));
        assert!(ContentFilter::new(Vec::<String>::new()).words().is_empty());
    }

    proptest! {
        #[test]
        fn prop_any_embedded_word_is_filtered(
            prefix in "[a-z ]{0,20}",
            suffix in "[a-z ]{0,20}",
            idx in 0usize..3,
        ) {
            let filter = ContentFilter::default();
            let text = format!("{}{}{}", prefix, DEFAULT_DENY_LIST[idx], suffix);
            prop_assert!(filter.is_filtered(&text));
        }

        #[test]
        fn prop_text_without_deny_letters_passes(text in "[b-jl-z0-9 ]{0,40}") {
            // No 'a' and no 'k': every deny-listed word needs one of them
            let filter = ContentFilter::default();
            prop_assert!(!filter.is_filtered(&text));
        }
    }
}
