//! The in-memory cache store and its load / update / save lifecycle.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::digest::Md5;
use crate::walker::Walker;

use super::entry::{self, CacheEntry};
use super::{normalize_rel, CacheError, IoOp};

/// Name of the persisted cache file, directly under the root.
pub const CACHE_FILE_NAME: &str = ".hash_cache.txt";

/// Scratch name used while rewriting the cache, renamed over the real file
/// once fully written.
const CACHE_TMP_NAME: &str = ".hash_cache.txt.tmp";

/// Mapping from normalized relative path to [`CacheEntry`].
///
/// Lifecycle: created empty, populated by [`CacheStore::load`], reconciled
/// against the tree by [`CacheStore::update`], written back by
/// [`CacheStore::save`]. Any load or update failure resets the store to
/// empty so a partially built mapping is never acted upon.
///
/// Entries are never deleted: a file that disappears from the tree keeps its
/// entry indefinitely. Timestamp repair depends on that — an entry must
/// survive periods where the file looks changed (or is briefly absent, as
/// during a branch switch) so an identical file seen later still matches.
#[derive(Debug, Default)]
pub struct CacheStore {
    files: BTreeMap<PathBuf, CacheEntry>,
    /// True iff an entry was added or its hash changed during this run.
    /// Process-local, never persisted; gates whether save touches the disk.
    modified: bool,
}

impl CacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether this run added entries or changed a hash.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Look up the entry for a path (normalized before lookup).
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&CacheEntry> {
        self.files.get(&normalize_rel(path))
    }

    /// Iterate over all entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&Path, &CacheEntry)> {
        self.files.iter().map(|(path, entry)| (path.as_path(), entry))
    }

    /// Insert an entry directly, marking the store modified.
    ///
    /// The path is normalized before insertion. `update` uses this for newly
    /// discovered files; it is also the way to seed a store programmatically.
    pub fn insert(&mut self, path: &Path, entry: CacheEntry) {
        self.files.insert(normalize_rel(path), entry);
        self.modified = true;
    }

    /// Populate the store from the cache file under `root`.
    ///
    /// A missing cache file is not an error; the store just stays empty.
    /// A malformed line or read failure aborts the load and resets the
    /// store to empty.
    ///
    /// # Errors
    ///
    /// [`CacheError::Parse`] with the offending raw line, or
    /// [`CacheError::Io`] with `op == ReadCache`.
    pub fn load(&mut self, root: &Path) -> Result<(), CacheError> {
        self.load_inner(root).inspect_err(|_| self.reset())
    }

    fn load_inner(&mut self, root: &Path) -> Result<(), CacheError> {
        let cache_path = root.join(CACHE_FILE_NAME);
        let read_err = |source| CacheError::Io {
            path: cache_path.clone(),
            op: IoOp::ReadCache,
            source,
        };
        let file = match File::open(&cache_path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no cache file at {}, starting empty", cache_path.display());
                return Ok(());
            }
            Err(err) => return Err(read_err(err)),
        };
        for line in BufReader::new(file).lines() {
            let line = line.map_err(read_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let (raw_path, entry) = CacheEntry::parse_line(&line)
                .ok_or(CacheError::Parse { line })?;
            // Later duplicate lines silently overwrite earlier ones.
            self.files.insert(normalize_rel(&raw_path), entry);
        }
        log::debug!(
            "loaded {} entries from {}",
            self.files.len(),
            cache_path.display()
        );
        Ok(())
    }

    /// Walk `root` and reconcile every regular file against the store.
    ///
    /// Hidden entries (final name component starting with `.`) are ignored
    /// and hidden directories are not descended into; their pre-existing
    /// cache entries are left untouched. Non-hidden directories are skipped,
    /// only files reach reconciliation.
    ///
    /// # Errors
    ///
    /// [`CacheError::Io`] identifying the path and the failed operation
    /// (walk, stat, read, or set-mtime). The store is reset to empty on
    /// failure.
    pub fn update(&mut self, root: &Path) -> Result<(), CacheError> {
        self.update_inner(root).inspect_err(|_| self.reset())
    }

    fn update_inner(&mut self, root: &Path) -> Result<(), CacheError> {
        let mut walker = Walker::new(root);
        while let Some(item) = walker.next() {
            let entry = item.map_err(|err| walk_error(root, err))?;
            let hidden = entry
                .path()
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'));
            if hidden {
                if entry.is_dir() {
                    walker.skip_current_dir();
                }
                log::trace!("ignoring hidden entry {}", entry.path().display());
                continue;
            }
            if entry.is_dir() {
                continue;
            }
            let path = entry.into_path();
            let key = normalize_rel(path.strip_prefix(root).unwrap_or(&path));
            self.reconcile(&path, key)?;
        }
        Ok(())
    }

    /// Decide among skip / repair / update / create for one file.
    ///
    /// `path` is the on-disk location, `key` its normalized relative form.
    fn reconcile(&mut self, path: &Path, key: PathBuf) -> Result<(), CacheError> {
        let metadata = fs::metadata(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            op: IoOp::Stat,
            source,
        })?;
        let mtime = entry::mtime_nanos(&metadata);

        match self.files.get_mut(&key) {
            None => {
                let hash = hash_file(path)?;
                log::debug!("new file {} ({hash})", key.display());
                self.files.insert(key, CacheEntry { timestamp: mtime, hash });
                self.modified = true;
            }
            Some(cached) if cached.timestamp == mtime => {
                // Fast path: matching timestamp, content presumed unchanged.
                log::trace!("unchanged {}", key.display());
            }
            Some(cached) => {
                let hash = hash_file(path)?;
                if hash == cached.hash {
                    // Metadata-only change: restore the recorded timestamp
                    // instead of recording a spurious content change.
                    filetime::set_file_mtime(path, entry::nanos_to_filetime(cached.timestamp))
                        .map_err(|source| CacheError::Io {
                            path: path.to_path_buf(),
                            op: IoOp::SetMtime,
                            source,
                        })?;
                    log::debug!("repaired timestamp of {}", key.display());
                } else {
                    log::debug!("content changed for {} ({hash})", key.display());
                    cached.timestamp = mtime;
                    cached.hash = hash;
                    self.modified = true;
                }
            }
        }
        Ok(())
    }

    /// Write the whole store back to the cache file under `root`.
    ///
    /// A no-op unless the store was marked modified during this run, so an
    /// unchanged cache file never has its own timestamp touched. The file is
    /// written to a scratch name first and renamed into place, so a failed
    /// save cannot leave a half-written cache that a later load would
    /// misparse.
    ///
    /// # Errors
    ///
    /// [`CacheError::Io`] with `op == WriteCache`.
    pub fn save(&self, root: &Path) -> Result<(), CacheError> {
        if !self.modified {
            log::debug!("cache unchanged, skipping save");
            return Ok(());
        }
        let cache_path = root.join(CACHE_FILE_NAME);
        let tmp_path = root.join(CACHE_TMP_NAME);
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CacheError::Io {
                path,
                op: IoOp::WriteCache,
                source,
            }
        };
        self.write_entries(&tmp_path).map_err(write_err(&tmp_path))?;
        fs::rename(&tmp_path, &cache_path).map_err(write_err(&cache_path))?;
        log::debug!(
            "saved {} entries to {}",
            self.files.len(),
            cache_path.display()
        );
        Ok(())
    }

    fn write_entries(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (key, entry) in &self.files {
            writeln!(writer, "{}", entry.format_line(key))?;
        }
        writer.flush()
    }

    fn reset(&mut self) {
        self.files.clear();
        self.modified = false;
    }
}

/// Hash a file's content, streaming it through the MD5 engine.
fn hash_file(path: &Path) -> Result<String, CacheError> {
    let io_err = |op| {
        let path = path.to_path_buf();
        move |source| CacheError::Io { path, op, source }
    };
    let file = File::open(path).map_err(io_err(IoOp::ReadFile))?;
    let digest = Md5::hash_reader(BufReader::new(file)).map_err(io_err(IoOp::ReadFile))?;
    Ok(digest.to_hex())
}

fn walk_error(root: &Path, err: walkdir::Error) -> CacheError {
    let path = err
        .path()
        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    CacheError::Io {
        path,
        op: IoOp::Walk,
        source: err.into(),
    }
}
