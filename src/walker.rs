//! Recursive directory walker with skip-descent control.
//!
//! Thin wrapper over [`walkdir`] that yields every entry under a root one at
//! a time and lets the consumer suppress recursion into the directory that
//! was just yielded. Sibling order is unspecified; callers must not depend
//! on it.
//!
//! The walker deliberately does not implement [`Iterator`]: the consumer
//! needs mutable access between items to call [`Walker::skip_current_dir`],
//! which an iterator adapter chain would hide.

use std::path::{Path, PathBuf};

use walkdir::{IntoIter, WalkDir};

/// A single filesystem entry produced by the walk.
#[derive(Debug)]
pub struct WalkEntry {
    path: PathBuf,
    is_dir: bool,
}

impl WalkEntry {
    /// Path of the entry, as reported by the underlying traversal
    /// (root-prefixed, not yet normalized).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Consume the entry, returning its path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Depth-first directory traversal under a fixed root.
///
/// The root entry itself is not yielded; enumeration starts with the root's
/// children. The walker holds a single open cursor for the traversal's
/// duration.
#[derive(Debug)]
pub struct Walker {
    inner: IntoIter,
}

impl Walker {
    /// Start a traversal rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        // min_depth(1) withholds the root entry itself; errors opening the
        // root still surface through next().
        Self {
            inner: WalkDir::new(root).min_depth(1).into_iter(),
        }
    }

    /// Advance to the next entry, if any.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<walkdir::Result<WalkEntry>> {
        self.inner.next().map(|res| {
            res.map(|entry| WalkEntry {
                is_dir: entry.file_type().is_dir(),
                path: entry.into_path(),
            })
        })
    }

    /// Do not descend into the directory most recently yielded by
    /// [`Walker::next`].
    pub fn skip_current_dir(&mut self) {
        self.inner.skip_current_dir();
    }
}
