//! Crashgroup
//!
//! Crash report signature extraction and group deduplication for
//! iOS/macOS crash logs.
//!
//! Every incoming crash is reduced to a signature (the first symbolicated
//! application frame of the crashed thread) and counted in the group for
//! that signature within its application version.
//!
//! This crate provides the core implementation for the
//! `crashgroup` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! crashgroup --db crashes.db ingest --file submission.json
//! crashgroup --db crashes.db groups --bundle com.foo.App --version 1.0
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod store;
pub mod utils;
