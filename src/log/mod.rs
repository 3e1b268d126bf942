//! Profiling log entries: decoding, key extraction and dump-file parsing.

pub mod entry;
pub mod parse;

pub use entry::RawLogEntry;
pub use parse::{KeyExtractor, parse_dump_file};
