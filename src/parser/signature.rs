//! The signature pipeline: block extraction, frame selection, decoding.
//!
//! Every crashed-thread block is tried in priority order, and within a
//! block every identity candidate in order. The first frame that decodes
//! produces the signature.

use super::frame::select_frame;
use super::pattern::build_pattern;
use super::thread_block::{extract_thread_blocks, BlockKind};
use log::debug;
use std::fmt;

/// Why no signature could be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The log has no crashed-thread block
    NoCrashedThread,
    /// No frame in the crashed thread mentions the app
    NoAppFrame,
    /// App frames exist but none is symbolicated with a source location
    Undecodable,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MissReason::NoCrashedThread => "no crashed-thread block",
            MissReason::NoAppFrame => "no application frame in crashed thread",
            MissReason::Undecodable => "application frame has no source location",
        };
        f.write_str(text)
    }
}

/// A successfully extracted signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Canonical group key
    pub pattern: String,

    /// Block the frame came from
    pub block: BlockKind,

    /// Index of the identity candidate that matched
    pub candidate: usize,

    /// The raw frame line
    pub frame: String,
}

/// Result of running the pipeline over one log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    Found(Signature),
    Miss(MissReason),
}

impl SignatureOutcome {
    /// Pattern to group by; empty on a miss
    pub fn pattern(&self) -> &str {
        match self {
            SignatureOutcome::Found(signature) => &signature.pattern,
            SignatureOutcome::Miss(_) => "",
        }
    }

    pub fn miss_reason(&self) -> Option<MissReason> {
        match self {
            SignatureOutcome::Found(_) => None,
            SignatureOutcome::Miss(reason) => Some(*reason),
        }
    }
}

/// Extract the grouping signature from a crash log
///
/// **Public** - main entry point of the parser
///
/// # Arguments
/// * `log_text` - Full raw crash log
/// * `identities` - App identities in priority order (display name, bundle identifier)
///
/// # Returns
/// `Found` with the first decodable app frame, or `Miss` with the reason
pub fn extract_signature(log_text: &str, identities: &[&str]) -> SignatureOutcome {
    let blocks = extract_thread_blocks(log_text);
    if blocks.is_empty() {
        return SignatureOutcome::Miss(MissReason::NoCrashedThread);
    }

    let mut saw_app_frame = false;

    for block in &blocks {
        for (index, identity) in identities.iter().enumerate() {
            let Some(frame) = select_frame(&block.lines, &[*identity]) else {
                continue;
            };
            saw_app_frame = true;

            if let Some(pattern) = build_pattern(frame.line) {
                debug!("Signature from {:?} block via identity {}: {}", block.kind, index, pattern);
                return SignatureOutcome::Found(Signature {
                    pattern,
                    block: block.kind,
                    candidate: index,
                    frame: frame.line.to_string(),
                });
            }
        }
    }

    if saw_app_frame {
        SignatureOutcome::Miss(MissReason::Undecodable)
    } else {
        SignatureOutcome::Miss(MissReason::NoAppFrame)
    }
}
