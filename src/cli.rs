//! Command-line interface definitions.
//!
//! The surface is deliberately tiny: no arguments runs quietly over the
//! current directory; `-v`/`--verbose` turns on step-by-step tracing.
//! Anything else is a usage error, which clap reports on its own.
//!
//! # Example
//!
//! ```bash
//! # Quiet run over the current directory
//! hashcache
//!
//! # Trace every reconciliation decision
//! hashcache --verbose
//! ```

use clap::Parser;

/// Directory hashing cache with timestamp repair.
///
/// Walks the current directory, fingerprints every regular file with MD5,
/// and maintains a `.hash_cache.txt` mapping each relative path to its
/// last-modified timestamp and hash. Files whose timestamp is unchanged are
/// not re-read; files whose timestamp changed but whose content did not get
/// their recorded timestamp written back instead of a new cache entry.
#[derive(Debug, Parser)]
#[command(name = "hashcache", version, about)]
pub struct Cli {
    /// Enable step-by-step progress logging
    #[arg(short, long)]
    pub verbose: bool,
}
