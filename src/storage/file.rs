//! Clearance pair persisted to a single JSON file.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument};

use super::ClearanceStore;
use crate::error::{Error, Result};
use crate::models::Clearance;

/// Owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Owner read/write/execute.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// Clearance pair persisted as one JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a reader sees either the old pair or the new one. Writers within the
/// process are serialized by a mutex.
///
/// # Security
/// - The file is created 0600 on Unix
/// - A missing parent directory is created 0700
#[derive(Debug)]
pub struct FileClearanceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileClearanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<()> {
        let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) else {
            return Ok(());
        };
        if dir.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create clearance directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir, std::fs::Permissions::from_mode(DIR_MODE)).map_err(
                |e| {
                    Error::Storage(format!(
                        "Failed to set directory permissions on '{}': {}",
                        dir.display(),
                        e
                    ))
                },
            )?;
        }
        Ok(())
    }

    fn write_atomic(&self, content: &str) -> Result<()> {
        let temp_path = self.path.with_extension("tmp");

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(FILE_MODE)
                .open(&temp_path)
                .map_err(|e| {
                    Error::Storage(format!(
                        "Failed to create temp file '{}': {}",
                        temp_path.display(),
                        e
                    ))
                })?;
            file.write_all(content.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| {
                    Error::Storage(format!(
                        "Failed to write temp file '{}': {}",
                        temp_path.display(),
                        e
                    ))
                })?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&temp_path, content).map_err(|e| {
                Error::Storage(format!(
                    "Failed to write temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(Error::Storage(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                self.path.display(),
                e
            )));
        }
        Ok(())
    }
}

impl ClearanceStore for FileClearanceStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Option<Clearance>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read clearance file '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let clearance = serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!(
                "Failed to parse clearance file '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(clearance))
    }

    #[instrument(skip(self, clearance), fields(path = %self.path.display()))]
    fn save(&self, clearance: &Clearance) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Storage("clearance write lock poisoned".into()))?;

        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(clearance)
            .map_err(|e| Error::Storage(format!("Failed to serialize clearance: {e}")))?;
        self.write_atomic(&content)?;

        debug!("Clearance pair written");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Storage("clearance write lock poisoned".into()))?;

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to remove clearance file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}
