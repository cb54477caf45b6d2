//! Multi-format OpenVPN status-file parsing.
//!
//! OpenVPN writes three status grammars, distinguished by the first line of
//! the file:
//! - server status v2 — comma-delimited `TITLE,` header
//! - server status v3 — tab-delimited `TITLE\t` header
//! - client statistics — `OpenVPN STATISTICS` key/value dump
//!
//! The format is decided once per document by [`StatusFormat::detect`] and
//! the result is a tagged [`ParsedStatus`]; callers dispatch on the variant
//! instead of re-testing string prefixes.
//!
//! Parsing is deliberately lenient at the line level: a single corrupt field
//! skips that line's contribution (recorded as a [`LineSkip`]) and never
//! aborts the rest of the document. Only an unrecognized first line fails
//! the whole document.

pub mod client_stats;
pub mod server;

pub use client_stats::{ClientStatsReport, StatCounter};
pub use server::{ClientRecord, RouteRecord, ServerReport};

/// The three known status-file grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    /// Server status version 2, comma-delimited.
    ServerV2,
    /// Server status version 3, tab-delimited.
    ServerV3,
    /// Client-side `OpenVPN STATISTICS` dump.
    ClientStats,
}

impl StatusFormat {
    /// Decides the grammar from the document's first line.
    pub fn detect(first_line: &str) -> Option<StatusFormat> {
        if first_line.starts_with("TITLE,") {
            Some(StatusFormat::ServerV2)
        } else if first_line.starts_with("TITLE\t") {
            Some(StatusFormat::ServerV3)
        } else if first_line.starts_with("OpenVPN STATISTICS") {
            Some(StatusFormat::ClientStats)
        } else {
            None
        }
    }
}

/// A fully parsed status document, tagged by grammar family.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStatus {
    /// Server status (v2 or v3 — identical after delimiter split).
    Server(ServerReport),
    /// Client statistics.
    Client(ClientStatsReport),
}

/// Document-level failure: the first line matched none of the grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat {
    /// The offending first line, truncated for logging.
    pub first_line: String,
}

impl UnknownFormat {
    fn new(first_line: &str) -> Self {
        // Char-based truncation: the line is untrusted and a byte cut could
        // land inside a multibyte sequence.
        Self {
            first_line: first_line.chars().take(50).collect(),
        }
    }
}

impl std::fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown status file format: {:?}", self.first_line)
    }
}

impl std::error::Error for UnknownFormat {}

/// Why a single line's contribution was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `TIME` epoch field or `Updated` timestamp failed to parse.
    BadUpdateTime,
    /// `CLIENT_LIST` byte counters failed to parse.
    BadByteCount,
    /// `ROUTING_TABLE` last-reference time failed to parse.
    BadLastRefTime,
    /// Client-stats counter value failed to parse.
    BadStatValue,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::BadUpdateTime => "bad update timestamp",
            SkipReason::BadByteCount => "bad byte count",
            SkipReason::BadLastRefTime => "bad last-reference time",
            SkipReason::BadStatValue => "bad counter value",
        };
        f.write_str(s)
    }
}

/// One skipped line in an otherwise successful parse.
///
/// Skips are values, not exceptions: callers log them and move on, which
/// keeps the "one bad line doesn't abort the document" contract explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSkip {
    /// 1-based line number in the document.
    pub line: usize,
    pub reason: SkipReason,
}

/// Parses one decoded status document.
///
/// `ignore_individuals` suppresses per-client and per-route record
/// extraction; aggregate counts (connected clients, update time) are still
/// produced.
pub fn parse_document(
    text: &str,
    ignore_individuals: bool,
) -> Result<ParsedStatus, UnknownFormat> {
    let first_line = text.lines().next().unwrap_or("");
    match StatusFormat::detect(first_line) {
        Some(StatusFormat::ServerV2) => Ok(ParsedStatus::Server(server::parse(
            text,
            ',',
            ignore_individuals,
        ))),
        Some(StatusFormat::ServerV3) => Ok(ParsedStatus::Server(server::parse(
            text,
            '\t',
            ignore_individuals,
        ))),
        Some(StatusFormat::ClientStats) => {
            Ok(ParsedStatus::Client(client_stats::parse(text)))
        }
        None => Err(UnknownFormat::new(first_line)),
    }
}
