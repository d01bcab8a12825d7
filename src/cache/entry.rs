//! Cache entry records and their text line format.
//!
//! One cache file line per tracked file:
//!
//! ```text
//! <timestamp:int64> <hash:32-hex-chars> <path>
//! ```
//!
//! The first two tokens end at the first run of spaces or tabs; the path is
//! the trimmed remainder of the line, so paths with internal spaces round-trip.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use filetime::FileTime;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// One tracked file: its last-modified time and content fingerprint.
///
/// The pair is consistent by construction: `hash` is always the digest of the
/// file's content as of the moment `timestamp` was recorded, and the two are
/// only ever written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Modification time as nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Lowercase hex MD5 digest of the file content.
    pub hash: String,
}

impl CacheEntry {
    /// Parse one cache file line into its path key and entry.
    ///
    /// Returns `None` when any of the three fields is missing or the
    /// timestamp is not an integer. The caller decides whether that is fatal
    /// (it is, for cache loading). The returned path is not yet normalized.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<(PathBuf, Self)> {
        let line = line.trim();
        let (timestamp_token, rest) = split_token(line);
        let timestamp: i64 = timestamp_token.parse().ok()?;
        let (hash, path_token) = split_token(rest);
        if hash.is_empty() {
            return None;
        }
        let path_token = path_token.trim();
        if path_token.is_empty() {
            return None;
        }
        Some((
            PathBuf::from(path_token),
            Self {
                timestamp,
                hash: hash.to_string(),
            },
        ))
    }

    /// Render the entry as a cache file line (without trailing newline).
    #[must_use]
    pub fn format_line(&self, path: &Path) -> String {
        format!("{} {} {}", self.timestamp, self.hash, path.display())
    }
}

/// Split off the leading token, consuming the space/tab run after it.
fn split_token(s: &str) -> (&str, &str) {
    match s.find([' ', '\t']) {
        Some(end) => (&s[..end], s[end..].trim_start_matches([' ', '\t'])),
        None => (s, ""),
    }
}

/// A file's modification time as nanoseconds since the Unix epoch.
#[must_use]
pub fn mtime_nanos(metadata: &Metadata) -> i64 {
    let mtime = FileTime::from_last_modification_time(metadata);
    mtime.unix_seconds() * NANOS_PER_SEC + i64::from(mtime.nanoseconds())
}

/// Convert a stored timestamp back into a [`FileTime`] for repair writes.
///
/// Euclidean division keeps the nanosecond part non-negative for pre-epoch
/// timestamps.
#[must_use]
pub fn nanos_to_filetime(nanos: i64) -> FileTime {
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SEC)).unwrap_or(0);
    FileTime::from_unix_time(secs, subsec)
}
