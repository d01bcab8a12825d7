//! hashcache - Directory hashing cache with timestamp repair.
//!
//! Walks a file tree, computes an MD5 content hash for each regular file,
//! and persists a mapping from relative path to (last-modified timestamp,
//! hash) in a hidden `.hash_cache.txt` file so a later run can skip
//! re-hashing unchanged files. When a file's timestamp changed but its
//! content did not (a metadata-only change, as after a checkout or clone),
//! the recorded timestamp is written back onto the file instead of recording
//! a spurious content change.

pub mod cache;
pub mod cli;
pub mod digest;
pub mod logging;
pub mod walker;

use std::path::Path;

use anyhow::{Context, Result};

use cache::CacheStore;
use cli::Cli;

/// Run one full load → update → save cycle over `root`.
///
/// # Errors
///
/// Any phase failure is returned with the phase named in the context; the
/// underlying [`cache::CacheError`] stays in the chain for diagnostics.
pub fn run_in(root: &Path) -> Result<()> {
    let mut store = CacheStore::new();
    store.load(root).context("loading the cache file")?;
    store.update(root).context("reconciling the file tree")?;
    store.save(root).context("saving the cache file")?;
    Ok(())
}

/// Application entry point used by the binary: initialize logging and run
/// over the current directory.
///
/// # Errors
///
/// See [`run_in`].
pub fn run(cli: &Cli) -> Result<()> {
    logging::init(cli.verbose);
    run_in(Path::new("."))
}
