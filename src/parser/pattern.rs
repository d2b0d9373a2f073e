//! Frame line decoding into canonical signatures.
//!
//! Frame lines look like
//!
//! ```text
//! 1   MyApp   0x00036e51   -[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)
//! 4   MyApp   0x00041a20   parse_header (parser.c:118)
//! ```
//!
//! The frame index and load address differ between runs, so the signature
//! keeps only the symbol and its source location.

use crate::utils::config::UNSYMBOLICATED_PREFIX;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A decoder turns a frame line into a signature, or declines
type Decoder = fn(&str) -> Option<String>;

/// Decoders in the order they are tried
const DECODERS: &[(&str, Decoder)] = &[
    ("message-send", decode_message_send),
    ("function", decode_function),
];

static MESSAGE_SEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(\S+)\s+(\S+)\s+[-+]\[(\S+)\s+(\S+)\]\s+\((\S+):(\S+)\)")
        .expect("valid regex")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(\S+)\s+(\S+)\s+(\S+)\s+\((\S+):(\S+)\)").expect("valid regex")
});

static STORED_MESSAGE_SEND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\S+)\s+(\S+)\]\s+\((\S+:\S+)\)$").expect("valid regex"));

static STORED_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+\((\S+:\S+)\)$").expect("valid regex"));

/// Build the signature for a frame line
///
/// **Public** - final stage of the signature pipeline
///
/// # Arguments
/// * `line` - A single frame line from a crashed-thread block
///
/// # Returns
/// `[Class Selector] (File:Line)` for message sends, `Symbol (File:Line)`
/// for plain functions, `None` when no decoder recognises the line.
///
/// # Example
/// ```ignore
/// let sig = build_pattern("1  MyApp  0x00036e51  -[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)");
/// assert_eq!(sig.as_deref(), Some("[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)"));
/// ```
pub fn build_pattern(line: &str) -> Option<String> {
    DECODERS.iter().find_map(|(name, decode)| {
        let pattern = decode(line)?;
        debug!("Decoded {} frame: {}", name, pattern);
        Some(pattern)
    })
}

/// `<index> <image> <address> -[<Class> <Selector>] (<File>:<Line>)`
fn decode_message_send(line: &str) -> Option<String> {
    let caps = MESSAGE_SEND.captures(line)?;
    Some(format!(
        "[{} {}] ({}:{})",
        &caps[4], &caps[5], &caps[6], &caps[7]
    ))
}

/// `<index> <image> <address> <Symbol> (<File>:<Line>)`
fn decode_function(line: &str) -> Option<String> {
    let caps = FUNCTION.captures(line)?;
    Some(format!("{} ({}:{})", &caps[4], &caps[5], &caps[6]))
}

/// A stored signature split back into its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternParts {
    /// Receiving class for message sends, `None` for plain functions
    pub class: Option<String>,

    /// Selector or function symbol
    pub method: String,

    /// `File:Line`
    pub location: String,
}

/// Split a stored signature into class, method and location
///
/// **Public** - used by the group report to arrange groups by class
///
/// # Returns
/// `None` for patterns that are not symbolicated source locations
pub fn decompose_pattern(pattern: &str) -> Option<PatternParts> {
    if pattern.starts_with(UNSYMBOLICATED_PREFIX) {
        return None;
    }

    if let Some(caps) = STORED_MESSAGE_SEND.captures(pattern) {
        return Some(PatternParts {
            class: Some(caps[1].to_string()),
            method: caps[2].to_string(),
            location: caps[3].to_string(),
        });
    }

    STORED_FUNCTION.captures(pattern).map(|caps| PatternParts {
        class: None,
        method: caps[1].to_string(),
        location: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_message_send_frame() {
        let line = "1  MyApp  0x00036e51  -[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)";
        assert_eq!(
            build_pattern(line).as_deref(),
            Some("[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)")
        );
    }

    #[test]
    fn test_class_method_frame() {
        let line = "7   MyApp   0x0001f00d +[Settings sharedSettings] (Settings.m:14)";
        assert_eq!(
            build_pattern(line).as_deref(),
            Some("[Settings sharedSettings] (Settings.m:14)")
        );
    }

    #[test]
    fn test_function_frame() {
        let line = "4   MyApp   0x00041a20 parse_header (parser.c:118)";
        assert_eq!(
            build_pattern(line).as_deref(),
            Some("parse_header (parser.c:118)")
        );
    }

    #[test]
    fn test_index_and_address_ignored() {
        let a = build_pattern("1 MyApp 0x00001111 -[Foo bar:] (Foo.m:10)");
        let b = build_pattern("9 MyApp 0x0000ffff -[Foo bar:] (Foo.m:10)");
        assert_eq!(a, b);
    }

    #[test]
    fn test_call_sites_are_distinct() {
        let a = build_pattern("1 MyApp 0x1 -[Foo bar:] (Foo.m:10)");
        let b = build_pattern("1 MyApp 0x1 -[Foo bar:] (Foo.m:11)");
        assert_ne!(a, b);
    }

    #[test]
    fn test_unsymbolicated_frame() {
        assert!(build_pattern("3   MyApp   0x00036e51 0x1000 + 224849").is_none());
        assert!(build_pattern("0   libobjc.A.dylib   0x3302ef7e objc_msgSend + 22").is_none());
        assert!(build_pattern("").is_none());
    }

    #[test]
    fn test_decompose_message_send() {
        let parts = decompose_pattern("[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)").unwrap();
        assert_eq!(
            parts,
            PatternParts {
                class: Some("LiveUpdateReader".to_string()),
                method: "databaseActions:".to_string(),
                location: "LiveUpdateReader.m:62".to_string(),
            }
        );
    }

    #[test]
    fn test_decompose_function() {
        let parts = decompose_pattern("parse_header (parser.c:118)").unwrap();
        assert_eq!(parts.class, None);
        assert_eq!(parts.method, "parse_header");
        assert_eq!(parts.location, "parser.c:118");
    }

    #[test]
    fn test_decompose_symbol_with_parentheses() {
        let pattern = build_pattern("4 MyApp 0x1 Foo::bar(int) (foo.cpp:3)").unwrap();
        assert_eq!(pattern, "Foo::bar(int) (foo.cpp:3)");

        let parts = decompose_pattern(&pattern).unwrap();
        assert_eq!(parts.class, None);
        assert_eq!(parts.method, "Foo::bar(int)");
        assert_eq!(parts.location, "foo.cpp:3");
    }

    #[test]
    fn test_decompose_unknown() {
        assert!(decompose_pattern("0x0003a2f1 MyApp").is_none());
        assert!(decompose_pattern("no location here").is_none());
    }
}
