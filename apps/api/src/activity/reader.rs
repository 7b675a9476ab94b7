//! Log viewer: read-only projection over the sent/error activity logs.
//!
//! Recomputed from the files on every query: read, classify, merge, sort newest
//! first, filter, paginate. Nothing is cached.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::activity::{ERROR_LOG, SENT_LOG};

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warning,
    Debug,
    Success,
    Info,
}

/// Which file a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Sent,
    Error,
}

impl LogSource {
    fn file_name(self) -> &'static str {
        match self {
            LogSource::Sent => SENT_LOG,
            LogSource::Error => ERROR_LOG,
        }
    }
}

/// Log-type selector of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFilter {
    #[default]
    All,
    Sent,
    Error,
}

impl LogFilter {
    fn sources(self) -> &'static [LogSource] {
        match self {
            LogFilter::All => &[LogSource::Sent, LogSource::Error],
            LogFilter::Sent => &[LogSource::Sent],
            LogFilter::Error => &[LogSource::Error],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub raw: String,
    /// `YYYY-MM-DD HH:MM:SS`, empty when the line has none.
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    pub source: LogSource,
}

#[derive(Debug, Clone)]
pub struct LogQuery {
    pub filter: LogFilter,
    pub limit: usize,
    pub search: Option<String>,
    /// 1-based.
    pub page: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            filter: LogFilter::All,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogStats {
    pub total: usize,
    pub sent: usize,
    pub error: usize,
    pub success: usize,
    pub debug: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
    pub stats: LogStats,
}

/// Checked in order; the first keyword found wins.
const LEVEL_KEYWORDS: &[(LogLevel, &[&str])] = &[
    (LogLevel::Error, &["error", "erreur"]),
    (LogLevel::Warning, &["warning", "avertissement"]),
    (LogLevel::Debug, &["debug"]),
    (LogLevel::Success, &["success", "succès"]),
];

fn timestamp_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})").expect("valid timestamp regex")
    })
}

/// Splits a raw line into (timestamp, level, message).
pub fn parse_line(line: &str) -> (String, LogLevel, String) {
    let (timestamp, message) = match timestamp_prefix().find(line) {
        Some(m) => {
            let rest = &line[m.end()..];
            (
                m.as_str().to_string(),
                rest.strip_prefix(' ').unwrap_or(rest).to_string(),
            )
        }
        None => (String::new(), line.to_string()),
    };

    let lowered = line.to_lowercase();
    let level = LEVEL_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(level, _)| *level)
        .unwrap_or(LogLevel::Info);

    (timestamp, level, message)
}

/// Non-empty lines of one log file, optionally newest first. A missing file
/// reads as empty; bytes that are not UTF-8 decode to U+FFFD.
pub fn read_source(path: &Path, newest_first: bool) -> std::io::Result<Vec<String>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let content = String::from_utf8_lossy(&bytes);
    let mut lines: Vec<String> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();
    if newest_first {
        lines.reverse();
    }
    Ok(lines)
}

/// Runs a query against the logs in `dir`.
pub fn query_logs(dir: &Path, query: &LogQuery) -> std::io::Result<LogPage> {
    let mut entries = Vec::new();
    for &source in query.filter.sources() {
        for raw in read_source(&dir.join(source.file_name()), true)? {
            let (timestamp, level, message) = parse_line(&raw);
            entries.push(LogEntry {
                raw,
                timestamp,
                level,
                message,
                source,
            });
        }
    }

    // Stable: lines without a timestamp keep their relative order at the end.
    entries.sort_by(|a, b| match (a.timestamp.is_empty(), b.timestamp.is_empty()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => b.timestamp.cmp(&a.timestamp),
    });

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        entries.retain(|e| e.message.to_lowercase().contains(&term));
    }

    let stats = LogStats {
        total: entries.len(),
        sent: entries.iter().filter(|e| e.source == LogSource::Sent).count(),
        error: entries.iter().filter(|e| e.source == LogSource::Error).count(),
        success: entries.iter().filter(|e| e.level == LogLevel::Success).count(),
        debug: entries.iter().filter(|e| e.level == LogLevel::Debug).count(),
    };

    let limit = query.limit.max(1);
    let page = query.page.max(1);
    let total = entries.len();
    let entries = entries
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Ok(LogPage {
        entries,
        total,
        total_pages: total.div_ceil(limit),
        page,
        stats,
    })
}
