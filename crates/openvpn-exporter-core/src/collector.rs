//! Per-path collection passes.
//!
//! One pass per configured status path: path guard → size check → bounded
//! read + lossy decode → content check → format detect → parse → metrics
//! update. A failure at any stage surfaces only as that path's
//! `openvpn_up = 0` — paths never affect each other and untrusted file
//! content never panics the process.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::guard::{ContentError, PathGuard, check_content, check_size};
use crate::metrics::MetricsModel;
use crate::parser::{self, ParsedStatus, UnknownFormat};

/// Configuration consumed by the collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Status-file paths, one independent OpenVPN instance each.
    pub status_paths: Vec<String>,
    /// Suppresses per-client and per-route label emission. Aggregate counts
    /// are still exported.
    #[serde(default)]
    pub ignore_individuals: bool,
}

/// Why one status path's pass failed.
#[derive(Debug)]
pub enum CollectError {
    /// Path is outside every allow-listed directory or failed to resolve.
    PathRejected,
    /// File metadata exceeds the size ceiling.
    SizeExceeded { size: u64 },
    /// Content is empty or matched the markup denylist.
    ContentRejected(ContentError),
    /// First line matched none of the three grammars.
    FormatUnrecognized(UnknownFormat),
    /// Reading an admitted path failed.
    Io(std::io::Error),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::PathRejected => write!(f, "path rejected by allow-list"),
            CollectError::SizeExceeded { size } => {
                write!(f, "file too large: {size} bytes")
            }
            CollectError::ContentRejected(e) => write!(f, "content rejected: {e}"),
            CollectError::FormatUnrecognized(e) => write!(f, "{e}"),
            CollectError::Io(e) => write!(f, "read failed: {e}"),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::ContentRejected(e) => Some(e),
            CollectError::FormatUnrecognized(e) => Some(e),
            CollectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ContentError> for CollectError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::TooLarge { size } => CollectError::SizeExceeded { size },
            other => CollectError::ContentRejected(other),
        }
    }
}

/// Runs parse-and-update passes over the configured status paths.
pub struct Collector {
    config: ExporterConfig,
    path_guard: PathGuard,
    metrics: MetricsModel,
}

impl Collector {
    /// Creates a collector with the default path allow-list.
    pub fn new(config: ExporterConfig) -> Self {
        Self::with_path_guard(config, PathGuard::default())
    }

    /// Creates a collector with an explicit path guard (tests, custom roots).
    pub fn with_path_guard(config: ExporterConfig, path_guard: PathGuard) -> Self {
        Self {
            config,
            path_guard,
            metrics: MetricsModel::new(),
        }
    }

    /// The metric registry this collector feeds.
    pub fn metrics(&self) -> &MetricsModel {
        &self.metrics
    }

    /// Runs one full collection pass over every configured path.
    ///
    /// Passes are independent: a failing path gets `up = 0` and a warning,
    /// and the sweep continues.
    pub fn collect(&self) {
        for status_path in &self.config.status_paths {
            match self.collect_path(status_path) {
                Ok(()) => self.metrics.set_up(status_path, true),
                Err(e) => {
                    warn!(path = %status_path, error = %e, "status collection failed");
                    self.metrics.set_up(status_path, false);
                }
            }
        }
    }

    fn collect_path(&self, status_path: &str) -> Result<(), CollectError> {
        let path = Path::new(status_path);

        // Re-validated on every pass; the filesystem can change between
        // scrapes.
        if !self.path_guard.is_allowed(path) {
            return Err(CollectError::PathRejected);
        }

        // Metadata-only probe before any content is loaded.
        let metadata = fs::metadata(path).map_err(CollectError::Io)?;
        check_size(metadata.len())?;

        let bytes = fs::read(path).map_err(CollectError::Io)?;
        let text = String::from_utf8_lossy(&bytes);
        check_content(&text)?;

        let parsed = parser::parse_document(&text, self.config.ignore_individuals)
            .map_err(CollectError::FormatUnrecognized)?;
        self.apply(status_path, &parsed);
        Ok(())
    }

    /// Applies one parsed document to the metric registry.
    fn apply(&self, status_path: &str, parsed: &ParsedStatus) {
        match parsed {
            ParsedStatus::Server(report) => {
                for skip in &report.skipped {
                    warn!(
                        path = status_path,
                        line = skip.line,
                        reason = %skip.reason,
                        "skipped status line"
                    );
                }
                if let Some(ts) = report.update_time {
                    self.metrics.set_update_time(status_path, ts);
                }
                for client in &report.clients {
                    self.metrics.observe_client(status_path, client);
                }
                for route in &report.routes {
                    self.metrics.observe_route(status_path, route);
                }
                // Gauge semantics: overwritten on every pass, not accumulated.
                self.metrics
                    .set_connected_clients(status_path, report.connected_clients as f64);
            }
            ParsedStatus::Client(report) => {
                for skip in &report.skipped {
                    debug!(
                        path = status_path,
                        line = skip.line,
                        reason = %skip.reason,
                        "skipped statistics line"
                    );
                }
                if let Some(ts) = report.update_time {
                    self.metrics.set_update_time(status_path, ts);
                }
                for (counter, value) in &report.counters {
                    self.metrics.inc_stat_counter(status_path, *counter, *value);
                }
            }
        }
    }
}
