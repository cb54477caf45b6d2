//! Input hardening for status files.
//!
//! Two gates run before any parsing happens:
//! - [`PathGuard`] — only paths under allow-listed directories may be opened
//! - content checks — size ceiling and a denylist of markup patterns that
//!   have no business appearing in an OpenVPN status file

mod content;
mod path;

pub use content::{ContentError, MAX_STATUS_FILE_BYTES, check_content, check_size};
pub use path::PathGuard;
