//! openvpn-exporter-core — parsing and validation for OpenVPN status files.
//!
//! Provides:
//! - `guard` — path allow-listing and content hardening for status files
//! - `sanitize` — label sanitization and address validation for untrusted fields
//! - `parser` — the three status-file grammars (server v2, server v3, client stats)
//! - `metrics` — Prometheus metric registry fed from parsed documents
//! - `collector` — one parse-and-update pass per configured status path
//! - `ratelimit` — sliding-window admission gate for the scrape endpoint
//!
//! Status files are untrusted input: every string field passes through
//! `sanitize` before it becomes a metric label, and no malformed file may
//! panic the process — failures surface as `openvpn_up = 0` for that path.

pub mod collector;
pub mod guard;
pub mod metrics;
pub mod parser;
pub mod ratelimit;
pub mod sanitize;

/// Crate version, exposed for the binary's `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
