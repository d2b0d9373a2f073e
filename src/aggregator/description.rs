//! Merging of diagnostic text into group descriptions.
//!
//! Text is appended only when the description does not already contain it,
//! so feeding the same crash information twice leaves the description as
//! it was.

use log::warn;

/// Separator between merged entries
const SEPARATOR: &str = "\n\n";

/// Result of a merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to add, or the text is already present
    Unchanged,
    /// The new full description
    Appended(String),
    /// Appending would exceed the length limit
    TooLong,
}

/// Merge `addition` into `existing`
///
/// **Public** - used by the group resolver on every resolution
///
/// # Arguments
/// * `existing` - Current group description
/// * `addition` - Supplementary text from the crash log
/// * `max_len` - Maximum description length in characters
pub fn merge_description(existing: &str, addition: &str, max_len: usize) -> MergeOutcome {
    let addition = addition.trim();
    if addition.is_empty() || existing.contains(addition) {
        return MergeOutcome::Unchanged;
    }

    let merged = if existing.trim().is_empty() {
        addition.to_string()
    } else {
        format!("{}{}{}", existing.trim_end(), SEPARATOR, addition)
    };

    if merged.chars().count() > max_len {
        MergeOutcome::TooLong
    } else {
        MergeOutcome::Appended(merged)
    }
}

/// Description for a freshly created group
///
/// Oversized text is cut at `max_len` characters rather than dropped.
pub fn seed_description(addition: Option<&str>, max_len: usize) -> String {
    let Some(addition) = addition else {
        return String::new();
    };

    match merge_description("", addition, max_len) {
        MergeOutcome::Appended(text) => text,
        MergeOutcome::Unchanged => String::new(),
        MergeOutcome::TooLong => {
            warn!("Crash information exceeds {} characters, truncating", max_len);
            addition.trim().chars().take(max_len).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_with_blank_line() {
        let outcome = merge_description("first reason", "second reason", 100);
        assert_eq!(
            outcome,
            MergeOutcome::Appended("first reason\n\nsecond reason".to_string())
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let MergeOutcome::Appended(once) = merge_description("a", "b", 100) else {
            panic!("expected append");
        };
        assert_eq!(merge_description(&once, "b", 100), MergeOutcome::Unchanged);
    }

    #[test]
    fn test_substring_counts_as_present() {
        let existing = "reason: index 3 beyond bounds [0 .. 2]";
        assert_eq!(
            merge_description(existing, "index 3 beyond bounds", 100),
            MergeOutcome::Unchanged
        );
    }

    #[test]
    fn test_near_duplicate_is_appended() {
        let outcome = merge_description("index 3 beyond bounds", "index 4 beyond bounds", 100);
        assert!(matches!(outcome, MergeOutcome::Appended(_)));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(merge_description("a", "   ", 100), MergeOutcome::Unchanged);
        assert_eq!(
            merge_description("", "b", 100),
            MergeOutcome::Appended("b".to_string())
        );
    }

    #[test]
    fn test_length_limit() {
        assert_eq!(merge_description("aaaa", "bbbb", 8), MergeOutcome::TooLong);
        assert!(matches!(merge_description("aa", "bb", 8), MergeOutcome::Appended(_)));
    }

    #[test]
    fn test_seed_description() {
        assert_eq!(seed_description(None, 10), "");
        assert_eq!(seed_description(Some("  reason \n"), 10), "reason");
        assert_eq!(seed_description(Some("abcdefghijkl"), 4), "abcd");
    }
}
