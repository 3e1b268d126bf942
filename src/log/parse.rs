use crate::log::entry::RawLogEntry;
use anyhow::{Context, bail};
use regex::Regex;
use std::fs;
use std::sync::LazyLock;

/// Collection name the server uses for command traffic.
const COMMAND_COLLECTION: &str = "$cmd";

/// Databases whose traffic is administrative noise.
const IGNORED_DATABASES: [&str; 2] = ["tmp", "system"];

/// `(collection, op_type)` pair an entry is counted under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationKey {
    pub collection: String,
    pub op_type: String,
}

// Capture:
// 1) op type: word characters
// 2) database: word characters and '-'
// 3) collection: word characters, '-', '.', '$'
// Anything after the collection name is ignored. Word characters are ASCII
// only, so `tést.users` does not match.
static PROFILE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*((?-u:\w)+)\s+((?-u:[\w-])+)\.((?-u:[\w\-.$])+)"#)
        .expect("profile line regex is valid")
});

/// Pulls an [`OperationKey`] out of a profiling entry's description.
#[derive(Debug, Clone, Copy)]
pub struct KeyExtractor {
    re: &'static Regex,
}

impl Default for KeyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyExtractor {
    pub fn new() -> Self {
        Self {
            re: &PROFILE_LINE_RE,
        }
    }

    /// Key for `entry`, or `None` when it is malformed or filtered out.
    pub fn extract(&self, entry: &RawLogEntry) -> Option<OperationKey> {
        let text = entry.description()?;
        self.extract_str(&text)
    }

    pub fn extract_str(&self, info: &str) -> Option<OperationKey> {
        let caps = self.re.captures(info)?;
        let op_type = caps.get(1)?.as_str();
        let database = caps.get(2)?.as_str();
        let collection = caps.get(3)?.as_str();

        if collection == COMMAND_COLLECTION || IGNORED_DATABASES.contains(&database) {
            return None;
        }

        Some(OperationKey {
            collection: collection.to_string(),
            op_type: op_type.to_string(),
        })
    }
}

/// Parse an exported profiling dump into entries.
///
/// Accepted shapes:
/// - a JSON array of profiler documents
/// - one JSON document per line (blank lines skipped)
pub fn parse_dump_file(path: &str) -> anyhow::Result<Vec<RawLogEntry>> {
    let text = fs::read_to_string(path).with_context(|| format!("read dump file {}", path))?;
    parse_dump_str(&text, path)
}

pub fn parse_dump_str(text: &str, origin: &str) -> anyhow::Result<Vec<RawLogEntry>> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text)
            .with_context(|| format!("dump parse error in {}: expected a JSON array", origin));
    }

    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if !line.starts_with('{') {
            bail!(
                "dump parse error at {}:{}: expected a JSON document: {:?}",
                origin,
                lno,
                line
            );
        }

        let entry: RawLogEntry = serde_json::from_str(line)
            .with_context(|| format!("dump parse error at {}:{}", origin, lno))?;
        out.push(entry);
    }

    Ok(out)
}
