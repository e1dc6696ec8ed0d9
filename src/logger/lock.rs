//! Scoped exclusive advisory lock on an open partition file.
//!
//! The lock is taken on the file handle itself and excludes every other
//! process (and every other handle in this process) that asks for the same
//! lock. It is released when the guard drops, so every exit path of a
//! critical section unlocks.
//!
//! Backends:
//! - Unix: `flock(2)` via `nix::fcntl::Flock`.
//! - Everything else: `std::fs::File::lock` (`LockFileEx` on Windows).

use std::fs::File;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::core::errors::{LinelogError, Result};

/// An open file held under an exclusive lock until dropped.
pub struct ExclusiveLock {
    inner: Backend,
}

#[cfg(unix)]
type Backend = nix::fcntl::Flock<File>;

#[cfg(not(unix))]
struct Backend(File);

impl ExclusiveLock {
    /// Block until the exclusive lock on `file` is granted.
    ///
    /// `path` is only used for error reporting.
    #[cfg(unix)]
    pub fn acquire(file: File, path: &Path) -> Result<Self> {
        let inner = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive).map_err(
            |(_file, e)| LinelogError::Lock {
                path: path.to_path_buf(),
                details: e.to_string(),
            },
        )?;
        Ok(Self { inner })
    }

    /// Block until the exclusive lock on `file` is granted.
    ///
    /// `path` is only used for error reporting.
    #[cfg(not(unix))]
    pub fn acquire(file: File, path: &Path) -> Result<Self> {
        file.lock().map_err(|e| LinelogError::Lock {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        Ok(Self {
            inner: Backend(file),
        })
    }
}

#[cfg(not(unix))]
impl Drop for Backend {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

impl Deref for ExclusiveLock {
    type Target = File;

    #[cfg(unix)]
    fn deref(&self) -> &File {
        &self.inner
    }

    #[cfg(not(unix))]
    fn deref(&self) -> &File {
        &self.inner.0
    }
}

impl DerefMut for ExclusiveLock {
    #[cfg(unix)]
    fn deref_mut(&mut self) -> &mut File {
        &mut self.inner
    }

    #[cfg(not(unix))]
    fn deref_mut(&mut self) -> &mut File {
        &mut self.inner.0
    }
}
