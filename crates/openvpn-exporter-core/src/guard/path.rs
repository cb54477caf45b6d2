//! Allow-list validation of status-file paths.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Validates status-file paths against an allow-list of root directories.
///
/// A path is admitted only if its canonical form (symlinks followed) is a
/// descendant of at least one root. Nothing is cached: the filesystem can
/// change between scrapes (a symlink swap, for instance), so both the
/// candidate and the roots are re-resolved on every check.
#[derive(Debug, Clone)]
pub struct PathGuard {
    roots: Vec<PathBuf>,
}

impl Default for PathGuard {
    /// Conventional OpenVPN status directories plus a local fixtures
    /// directory for testing.
    fn default() -> Self {
        Self::new(vec![
            PathBuf::from("/var/log/openvpn"),
            PathBuf::from("/etc/openvpn"),
            PathBuf::from("/tmp/openvpn"),
            PathBuf::from("./fixtures"),
        ])
    }
}

impl PathGuard {
    /// Creates a guard with an explicit set of allowed root directories.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Returns `true` if `path` resolves inside at least one allowed root.
    ///
    /// Resolution failures (missing file, broken symlink, permission error)
    /// are rejections, not errors: the caller must not open the file, and
    /// the process must not crash on a hostile path.
    pub fn is_allowed(&self, path: &Path) -> bool {
        let resolved = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "status path failed to resolve");
                return false;
            }
        };

        for root in &self.roots {
            // Roots that do not exist on this host simply never match.
            let Ok(root) = root.canonicalize() else {
                continue;
            };
            if resolved.starts_with(&root) {
                return true;
            }
        }

        warn!(path = %path.display(), "status path outside allowed directories");
        false
    }
}
