//! Auxiliary facts pulled from a crash log besides the signature.

use super::thread_block::block_after_header;
use crate::utils::config::{APP_INFO_HEADER, JAILBREAK_MARKER};
use regex::Regex;
use std::sync::LazyLock;

static APP_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(APP_INFO_HEADER))).expect("valid regex")
});

/// Extract the "Application Specific Information" block
///
/// **Public** - feeds the description merger
///
/// # Returns
/// The block text with surrounding whitespace removed, or `None` when the
/// log has no such block.
pub fn extract_app_info(log_text: &str) -> Option<String> {
    block_after_header(&APP_INFO, log_text)
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether the log shows signs of a jailbroken device
pub fn is_jailbroken(log_text: &str) -> bool {
    log_text.contains(JAILBREAK_MARKER)
}
