//! Selection of the first application-owned frame in a thread block.
//!
//! A frame belongs to the app when its line mentions one of the app's
//! identities. The display name is tried first; binaries that do not embed
//! it are found through the bundle identifier instead.

use crate::utils::config::TRAMPOLINE_FRAME;
use log::debug;

/// A frame line chosen from a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedFrame<'a> {
    /// The frame line itself
    pub line: &'a str,

    /// Index into the candidate list that matched
    pub candidate: usize,

    /// Position of the line within the block
    pub position: usize,
}

/// Pick the first frame line containing one of the identity candidates
///
/// **Public** - second stage of the signature pipeline
///
/// # Arguments
/// * `lines` - Frame lines of a crashed-thread block, top of stack first
/// * `candidates` - Identity strings in priority order (display name, bundle identifier)
///
/// # Returns
/// The first matching line of the first candidate that matches anything.
/// Empty candidates never match, and the crash reporter's exception handler
/// trampoline is always skipped.
pub fn select_frame<'a, S: AsRef<str>>(
    lines: &'a [S],
    candidates: &[&str],
) -> Option<SelectedFrame<'a>> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| !candidate.is_empty())
        .find_map(|(candidate_index, candidate)| {
            let selected = scan_for(lines, candidate).map(|(position, line)| SelectedFrame {
                line,
                candidate: candidate_index,
                position,
            });
            if selected.is_none() {
                debug!("No frame mentions '{}'", candidate);
            }
            selected
        })
}

/// One top-to-bottom pass for a single candidate
///
/// **Private** - internal helper for select_frame
fn scan_for<'a, S: AsRef<str>>(lines: &'a [S], candidate: &str) -> Option<(usize, &'a str)> {
    lines
        .iter()
        .map(|line| -> &'a str { line.as_ref() })
        .enumerate()
        .filter(|(_, line)| !line.contains(TRAMPOLINE_FRAME))
        .find(|(_, line)| line.contains(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Vec<String> {
        vec![
            "0   CoreFoundation   0x30d2ae6f __exceptionPreprocess + 118".to_string(),
            "1   MyApp            0x000a1b2c uncaught_exception_handler (PLCrashReporter.m:137)".to_string(),
            "2   MyApp            0x00036e51 -[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)".to_string(),
            "3   MyApp            0x00036f00 -[LiveUpdateReader start] (LiveUpdateReader.m:20)".to_string(),
        ]
    }

    #[test]
    fn test_skips_trampoline() {
        let lines = block();
        let frame = select_frame(&lines, &["MyApp"]).unwrap();

        assert_eq!(frame.position, 2);
        assert_eq!(frame.candidate, 0);
        assert!(frame.line.contains("databaseActions:"));
    }

    #[test]
    fn test_falls_back_to_bundle_identifier() {
        let lines = vec![
            "0   libobjc.A.dylib   0x1 objc_msgSend + 22".to_string(),
            "1   com.foo.App       0x2 -[Foo bar:] (Foo.m:10)".to_string(),
        ];
        let frame = select_frame(&lines, &["Foo Display", "com.foo.App"]).unwrap();

        assert_eq!(frame.candidate, 1);
        assert_eq!(frame.position, 1);
    }

    #[test]
    fn test_primary_wins_even_if_lower_in_block() {
        let lines = vec![
            "0   com.foo.App   0x1 helper (Helper.c:3)".to_string(),
            "1   Foo           0x2 -[Foo bar:] (Foo.m:10)".to_string(),
        ];
        let frame = select_frame(&lines, &["Foo", "com.foo.App"]).unwrap();

        // "Foo" does not occur in line 0 ("com.foo.App" is lowercase)
        assert_eq!(frame.position, 1);
        assert_eq!(frame.candidate, 0);
    }

    #[test]
    fn test_no_frame() {
        let lines = block();
        assert!(select_frame(&lines, &["OtherApp", "com.other"]).is_none());
        assert!(select_frame(&lines, &["", ""]).is_none());

        let empty: Vec<String> = Vec::new();
        assert!(select_frame(&empty, &["MyApp"]).is_none());
    }
}
