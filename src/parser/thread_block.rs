//! Crashed-thread block extraction.
//!
//! A crash log lists every thread's backtrace. Only the frames of the
//! thread that crashed matter for grouping, so this module cuts that block
//! out of the raw text. Extractors are tried in priority order:
//!
//! 1. `Thread N Crashed:  Dispatch queue: com.apple.main-thread`
//! 2. `Thread N Crashed:`
//!
//! A block runs from the line after its header to the next blank line.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// Which header a block was found under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Crashed thread running the main dispatch queue
    MainQueue,
    /// Any crashed thread
    CrashedThread,
}

/// Frame lines of a crashed thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadBlock {
    pub kind: BlockKind,
    pub lines: Vec<String>,
}

static MAIN_QUEUE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Thread \d+ Crashed::?[ \t]+Dispatch queue:[ \t]*com\.apple\.main-thread")
        .expect("valid regex")
});

static CRASHED_THREAD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Thread \d+ Crashed:").expect("valid regex"));

/// Extractors in the order they are tried
static EXTRACTORS: LazyLock<[(BlockKind, &'static Regex); 2]> = LazyLock::new(|| {
    [
        (BlockKind::MainQueue, &*MAIN_QUEUE_HEADER),
        (BlockKind::CrashedThread, &*CRASHED_THREAD_HEADER),
    ]
});

/// Extract every crashed-thread block, best candidate first
///
/// **Public** - used by the signature pipeline
///
/// # Arguments
/// * `log_text` - Full raw crash log
///
/// # Returns
/// Matching blocks in extractor priority order. Empty if the log has no
/// crashed-thread header at all.
pub fn extract_thread_blocks(log_text: &str) -> Vec<ThreadBlock> {
    let blocks: Vec<ThreadBlock> = EXTRACTORS
        .iter()
        .filter_map(|(kind, header)| {
            block_after_header(header, log_text).map(|lines| ThreadBlock {
                kind: *kind,
                lines: lines.into_iter().map(str::to_string).collect(),
            })
        })
        .collect();

    debug!("Found {} crashed-thread block(s)", blocks.len());
    blocks
}

/// Extract the highest priority crashed-thread block
///
/// **Public** - convenience for callers that only need one block
pub fn extract_crashed_thread(log_text: &str) -> Option<ThreadBlock> {
    extract_thread_blocks(log_text).into_iter().next()
}

/// Lines following the first `header` match, up to the next blank line
///
/// **Private** - shared with the app info extractor
pub(crate) fn block_after_header<'a>(header: &Regex, text: &'a str) -> Option<Vec<&'a str>> {
    let found = header.find(text)?;

    // The rest of the header line is not part of the block
    let (_, body) = text[found.end()..].split_once('\n')?;

    let lines: Vec<&str> = body
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_QUEUE_LOG: &str = "Incident Identifier: ABC\n\
Exception Type:  EXC_BAD_ACCESS (SIGSEGV)\n\
\n\
Thread 0 Crashed:  Dispatch queue: com.apple.main-thread\n\
0   libobjc.A.dylib     0x3302ef7e objc_msgSend + 22\n\
1   MyApp               0x00036e51 -[LiveUpdateReader databaseActions:] (LiveUpdateReader.m:62)\n\
\n\
Thread 1:\n\
0   libsystem_kernel.dylib  0x30b3c010 mach_msg_trap + 20\n";

    #[test]
    fn test_main_queue_block() {
        let blocks = extract_thread_blocks(MAIN_QUEUE_LOG);

        // The generic header matches the same thread as a fallback
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::MainQueue);
        assert_eq!(blocks[0].lines.len(), 2);
        assert!(blocks[0].lines[1].contains("LiveUpdateReader"));
    }

    #[test]
    fn test_generic_crashed_thread_block() {
        let log = "Thread 3 Crashed:\n0   MyApp  0x1 main (main.m:5)\n1   libdyld 0x2 start\n\nThread 3 crashed with ARM Thread State:\n";
        let block = extract_crashed_thread(log).unwrap();

        assert_eq!(block.kind, BlockKind::CrashedThread);
        assert_eq!(block.lines, vec![
            "0   MyApp  0x1 main (main.m:5)".to_string(),
            "1   libdyld 0x2 start".to_string(),
        ]);
    }

    #[test]
    fn test_double_colon_header() {
        let log = "Thread 0 Crashed:: Dispatch queue: com.apple.main-thread\n0 MyApp 0x1 foo (a.c:1)\n";
        let block = extract_crashed_thread(log).unwrap();
        assert_eq!(block.kind, BlockKind::MainQueue);
        assert_eq!(block.lines.len(), 1);
    }

    #[test]
    fn test_crlf_log() {
        let log = "Thread 0 Crashed:\r\n0 MyApp 0x1 foo (a.c:1)\r\n\r\nThread 1:\r\n";
        let block = extract_crashed_thread(log).unwrap();
        assert_eq!(block.lines, vec!["0 MyApp 0x1 foo (a.c:1)".to_string()]);
    }

    #[test]
    fn test_no_crashed_thread() {
        let log = "Thread 0:\n0 MyApp 0x1 foo (a.c:1)\n\n";
        assert!(extract_thread_blocks(log).is_empty());
        assert!(extract_crashed_thread("").is_none());
    }

    #[test]
    fn test_header_without_frames() {
        let log = "Thread 0 Crashed:\n\nThread 1:\n";
        assert!(extract_crashed_thread(log).is_none());
    }
}
