//! Document storage with optimistic concurrency.
//!
//! A [`Revision`] is the SHA-256 of the bytes a document was read from.
//! Saving re-hashes what is currently stored and refuses to write when it
//! no longer matches the revision the caller loaded.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::document::Document;
use crate::StoreError;

/// Content hash of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// Nothing stored yet.
    Missing,
    /// SHA-256 of the stored bytes.
    Content([u8; 32]),
}

impl Revision {
    /// Revision of the given document bytes.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self::Content(Sha256::digest(bytes).into())
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "none"),
            Self::Content(hash) => {
                for byte in &hash[..6] {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A loaded document with the revision it was read at.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The document.
    pub document: Document,
    /// Revision to pass back to [`Storage::save`].
    pub revision: Revision,
}

/// Backing storage for the ledger document.
pub trait Storage {
    /// Read the current document. A store with nothing in it yields the
    /// empty document at [`Revision::Missing`].
    fn load(&self) -> Result<Snapshot, StoreError>;

    /// Replace the stored document, provided the store is still at
    /// `expected`. Returns the new revision.
    fn save(&self, document: &Document, expected: Revision) -> Result<Revision, StoreError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn load(&self) -> Result<Snapshot, StoreError> {
        (**self).load()
    }

    fn save(&self, document: &Document, expected: Revision) -> Result<Revision, StoreError> {
        (**self).save(document, expected)
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<Snapshot, StoreError> {
    let document = Document::from_slice(bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Snapshot {
        document,
        revision: Revision::of(bytes),
    })
}

fn encode(path: &Path, document: &Document) -> Result<Vec<u8>, StoreError> {
    document.to_vec().map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn check_revision(path: &Path, expected: Revision, found: Revision) -> Result<(), StoreError> {
    if expected == found {
        Ok(())
    } else {
        Err(StoreError::ConcurrentWriteConflict {
            path: path.to_path_buf(),
            expected,
            found,
        })
    }
}

/// How long [`JsonStore::save`] waits for another writer's lock by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL: Duration = Duration::from_millis(10);

/// Exclusive claim on a store file, held from the revision check until the
/// new file is renamed into place. Removed on drop.
#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf, timeout: Duration) -> Result<Self, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // The pid only helps whoever finds a stale lock.
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        warn!(lock = %path.display(), "gave up waiting for store lock");
                        return Err(StoreError::Locked { path });
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to remove store lock");
        }
    }
}

/// A document stored as a JSON file.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the original, so readers see either the old or the new
/// document and never a partial one. Writers, in this process or another,
/// take turns through a `<store>.lock` file next to the store.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock_timeout: Duration,
    // Writers sharing this handle queue here instead of polling the lock file.
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Store backed by the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            write_lock: Mutex::new(()),
        }
    }

    /// Wait at most `timeout` for another writer's lock before failing with
    /// [`StoreError::Locked`].
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The lock file writers hold while saving.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for JsonStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        match self.read()? {
            Some(bytes) => decode(&self.path, &bytes),
            None => Ok(Snapshot {
                document: Document::default(),
                revision: Revision::Missing,
            }),
        }
    }

    fn save(&self, document: &Document, expected: Revision) -> Result<Revision, StoreError> {
        let _guard = self.write_lock.lock();
        let _lock = LockFile::acquire(self.lock_path(), self.lock_timeout)?;

        let found = self.read()?.map_or(Revision::Missing, |b| Revision::of(&b));
        check_revision(&self.path, expected, found)?;

        let bytes = encode(&self.path, document)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        let revision = Revision::of(&bytes);
        debug!(path = %self.path.display(), %revision, "store saved");
        Ok(revision)
    }
}

/// A document held in memory, for tests and embedding.
///
/// The serialized bytes are kept so that revisions behave exactly as they
/// do for [`JsonStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `document`.
    pub fn with_document(document: &Document) -> Result<Self, StoreError> {
        let bytes = encode(Self::path(), document)?;
        Ok(Self {
            bytes: Mutex::new(Some(bytes)),
        })
    }

    /// The stored bytes, if any.
    #[must_use]
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes.lock().clone()
    }

    fn path() -> &'static Path {
        Path::new("<memory>")
    }
}

impl Storage for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        match self.bytes.lock().as_deref() {
            Some(bytes) => decode(Self::path(), bytes),
            None => Ok(Snapshot {
                document: Document::default(),
                revision: Revision::Missing,
            }),
        }
    }

    fn save(&self, document: &Document, expected: Revision) -> Result<Revision, StoreError> {
        let mut stored = self.bytes.lock();
        let found = stored.as_deref().map_or(Revision::Missing, Revision::of);
        check_revision(Self::path(), expected, found)?;

        let bytes = encode(Self::path(), document)?;
        let revision = Revision::of(&bytes);
        *stored = Some(bytes);
        Ok(revision)
    }
}
