//! Cross-process lock on a snapshot file.
//!
//! A [`MemoryStore`](super::MemoryStore) snapshot is read at the start of a
//! session and rewritten at the end. Two writers interleaving load and save
//! would each drop the other's reports, so a writing session holds an
//! exclusive advisory lock on `<snapshot>.lock` from before the load until
//! after the save. Readers take a shared lock and never see a half-finished
//! session's file.
//!
//! The lock is released when the [`SnapshotLock`] is dropped.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use super::StoreResult;

/// Whether a session only reads the snapshot or also rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// An advisory lock held on a snapshot's lock file.
#[derive(Debug)]
pub struct SnapshotLock {
    _file: File,
    path: PathBuf,
    mode: LockMode,
}

impl SnapshotLock {
    /// The lock file guarding `snapshot`: the same path with `.lock` appended.
    pub fn lock_path(snapshot: &Path) -> PathBuf {
        let mut name = OsString::from(snapshot.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Block until the lock on `snapshot` is held in `mode`.
    pub fn acquire(snapshot: &Path, mode: LockMode) -> StoreResult<Self> {
        let (file, path) = open_lock_file(snapshot)?;
        match try_lock(&file, mode) {
            Ok(true) => {}
            Ok(false) => {
                info!(path = %path.display(), "Snapshot is in use by another session, waiting");
                match mode {
                    LockMode::Shared => FileExt::lock_shared(&file)?,
                    LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
                }
            }
            Err(e) => return Err(e.into()),
        }
        debug!(path = %path.display(), ?mode, "Snapshot lock acquired");
        Ok(Self {
            _file: file,
            path,
            mode,
        })
    }

    /// Take the lock without waiting; `None` when another session holds it.
    pub fn try_acquire(snapshot: &Path, mode: LockMode) -> StoreResult<Option<Self>> {
        let (file, path) = open_lock_file(snapshot)?;
        if !try_lock(&file, mode)? {
            return Ok(None);
        }
        Ok(Some(Self {
            _file: file,
            path,
            mode,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

fn open_lock_file(snapshot: &Path) -> StoreResult<(File, PathBuf)> {
    let path = SnapshotLock::lock_path(snapshot);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    Ok((file, path))
}

/// `Ok(false)` when the lock is held elsewhere.
fn try_lock(file: &File, mode: LockMode) -> std::io::Result<bool> {
    let result = match mode {
        LockMode::Shared => FileExt::try_lock_shared(file),
        LockMode::Exclusive => FileExt::try_lock_exclusive(file),
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(false),
        Err(e) => Err(e),
    }
}
