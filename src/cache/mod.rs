//! Persistent path → (timestamp, hash) cache.
//!
//! The cache maps every regular file under a root directory to the pair
//! (last-modified timestamp, MD5 hex digest) and persists that mapping in a
//! hidden text file so later runs can skip re-hashing files whose timestamp
//! is unchanged.
//!
//! # Architecture
//!
//! * [`entry`]: the per-file record, its text line format, and timestamp
//!   conversions.
//! * [`store`]: the in-memory map plus the load / update / save lifecycle,
//!   including timestamp repair.
//!
//! # Reconciliation
//!
//! For each discovered file, [`store::CacheStore::update`] decides among:
//!
//! * **skip** — timestamp matches the cached one, content presumed unchanged;
//! * **repair** — timestamp differs but the hash matches, so the cached
//!   timestamp is written back onto the file;
//! * **update** — hash differs, the entry gets the new hash and timestamp;
//! * **create** — no entry existed yet.
//!
//! Only update and create mark the store modified; saving is skipped
//! entirely when nothing was modified.

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheStore, CACHE_FILE_NAME};

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// The filesystem operation a [`CacheError::Io`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Reading the cache file.
    ReadCache,
    /// Writing or replacing the cache file.
    WriteCache,
    /// Advancing the directory traversal.
    Walk,
    /// Reading a file's metadata.
    Stat,
    /// Reading a file's content for hashing.
    ReadFile,
    /// Rewriting a file's modification time during repair.
    SetMtime,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadCache => "reading cache file",
            Self::WriteCache => "writing cache file",
            Self::Walk => "walking directory",
            Self::Stat => "reading metadata",
            Self::ReadFile => "reading file",
            Self::SetMtime => "setting modification time",
        };
        f.write_str(name)
    }
}

/// Errors produced by the cache lifecycle.
///
/// Any error leaves the store reset to empty; partially built state is never
/// kept.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// A cache file line did not parse as `<timestamp> <hash> <path>`.
    #[error("unrecognized cache entry: {line:?}")]
    Parse {
        /// The offending raw line.
        line: String,
    },

    /// A filesystem operation failed.
    #[error("{} failed for {}: {}", .op, .path.display(), .source)]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Which operation failed.
        op: IoOp,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Normalize a path for use as a cache key: keep only normal components,
/// resolve `..` lexically, drop `.` and any root or prefix.
///
/// Applied once at the boundary (walk results, parsed cache lines) so the
/// rest of the store never sees unnormalized paths.
#[must_use]
pub fn normalize_rel(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}
