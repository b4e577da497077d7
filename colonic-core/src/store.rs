// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Read access to the shared hierarchical key-value store.
//!
//! The controller only ever reads: the interface name override and the
//! status record written by the hotplug infrastructure. Writers live outside
//! this crate, so no locking discipline is imposed here; a read simply
//! observes whatever value is present at that moment.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use nix::errno::Errno;

use crate::error::StoreError;

/// Store read contract.
///
/// `Ok(None)` means the key is not set, which is never an error.
pub trait Store: Send + Sync {
    fn read(&self, path: &str) -> Result<Option<String>, StoreError>;
}

/// In-memory store keyed by full path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, String>,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<String>, value: impl Into<String>) {
        self.data.insert(path.into(), value.into());
    }

    pub fn delete(&self, path: &str) {
        self.data.remove(path);
    }

    /// Make every subsequent read fail as if the store had gone away.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

impl Store for MemoryStore {
    fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable {
                path: path.to_string(),
                reason: "store connection closed".to_string(),
            });
        }
        Ok(self.data.get(path).map(|v| v.value().clone()))
    }
}

/// Store mirrored onto a directory tree.
///
/// `/a/b/c` is the file `<root>/a/b/c`. A missing file is an unset key and a
/// directory carries no value of its own.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a store path onto the filesystem, refusing anything that could
    /// escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = path.strip_prefix('/').ok_or_else(|| StoreError::Malformed {
            path: path.to_string(),
            reason: "path must be absolute".to_string(),
        })?;

        let mut full = self.root.clone();
        for component in relative.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(StoreError::Malformed {
                    path: path.to_string(),
                    reason: format!("invalid path component '{}'", component),
                });
            }
            full.push(component);
        }
        Ok(full)
    }
}

impl Store for DirStore {
    fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::Unreachable {
                path: path.to_string(),
                reason: format!("store root {} is not a directory", self.root.display()),
            });
        }

        let file = self.resolve(path)?;

        match std::fs::read(&file) {
            Ok(bytes) => {
                let mut value = String::from_utf8(bytes).map_err(|e| StoreError::Malformed {
                    path: path.to_string(),
                    reason: format!("value is not UTF-8: {}", e),
                })?;
                // Values written with `echo` carry a trailing newline.
                if value.ends_with('\n') {
                    value.pop();
                }
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.raw_os_error() == Some(Errno::EISDIR as i32) => Ok(None),
            Err(e) if e.raw_os_error() == Some(Errno::ENOTDIR as i32) => {
                Err(StoreError::Malformed {
                    path: path.to_string(),
                    reason: "a parent node holds a value, not children".to_string(),
                })
            }
            Err(e) => Err(StoreError::Unreachable {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
