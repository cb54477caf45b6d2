//! Size ceiling and markup denylist for status-file content.

/// Maximum size of a status file (10 MiB). Checked against file metadata
/// before any content is read.
pub const MAX_STATUS_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Markup fragments that never appear in a legitimate status file.
///
/// A match is a format-integrity signal, not a permissive filter: the whole
/// document is rejected. Matching is case-insensitive.
const MARKUP_DENYLIST: &[&str] = &[
    "<script",
    "javascript:",
    "vbscript:",
    "data:text/html",
    "<iframe",
    "<object",
    "<embed",
];

/// Why a status file's content was rejected before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// File metadata reports more than [`MAX_STATUS_FILE_BYTES`].
    TooLarge { size: u64 },
    /// Decoded content is empty.
    Empty,
    /// Decoded content matched the markup denylist.
    SuspiciousMarkup { pattern: &'static str },
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentError::TooLarge { size } => {
                write!(f, "file too large: {size} bytes (max {MAX_STATUS_FILE_BYTES})")
            }
            ContentError::Empty => write!(f, "empty status file"),
            ContentError::SuspiciousMarkup { pattern } => {
                write!(f, "suspicious content: matched {pattern:?}")
            }
        }
    }
}

impl std::error::Error for ContentError {}

/// Rejects files whose on-disk size exceeds the ceiling.
///
/// Takes the metadata-reported length so the check runs before a single
/// content byte is loaded.
pub fn check_size(len: u64) -> Result<(), ContentError> {
    if len > MAX_STATUS_FILE_BYTES {
        return Err(ContentError::TooLarge { size: len });
    }
    Ok(())
}

/// Scans decoded text for the markup denylist; rejects empty content.
pub fn check_content(text: &str) -> Result<(), ContentError> {
    if text.is_empty() {
        return Err(ContentError::Empty);
    }

    let lowered = text.to_ascii_lowercase();
    for pattern in MARKUP_DENYLIST {
        if lowered.contains(pattern) {
            return Err(ContentError::SuspiciousMarkup { pattern });
        }
    }
    Ok(())
}
