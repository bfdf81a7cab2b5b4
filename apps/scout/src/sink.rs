//! Persistence sink: three newline-joined text files, replaced every cycle.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::classifier::Classification;
use crate::errors::AppError;

pub const GREENHOUSE_FILE: &str = "greenhouse.txt";
pub const LEVER_FILE: &str = "lever.txt";
pub const BOTH_FILE: &str = "both.txt";

#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone)]
pub struct OutputSink {
    dir: PathBuf,
}

impl OutputSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Overwrites all three files with the current classification.
    ///
    /// Each file is written to a temp file in the same directory and renamed
    /// into place, so readers never see a half-written list.
    pub fn write(&self, classification: &Classification) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| AppError::Persistence {
            path: self.dir.clone(),
            source,
        })?;

        self.write_list(GREENHOUSE_FILE, &classification.only_greenhouse)?;
        self.write_list(LEVER_FILE, &classification.only_lever)?;
        self.write_list(BOTH_FILE, &classification.both)?;

        info!(dir = %self.dir.display(), "Output files written");
        Ok(())
    }

    fn write_list(&self, file: &str, names: &[String]) -> Result<(), AppError> {
        let path = self.path_for(file);
        replace_file(&self.dir, &path, names.join("\n").as_bytes()).map_err(|source| {
            AppError::Persistence {
                path: path.clone(),
                source,
            }
        })
    }
}

fn replace_file(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    // Temp files are created owner-only; the list keeps the target's mode.
    tmp.as_file().set_permissions(target_permissions(path, tmp.as_file())?)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Mode of the existing target, or 0644 for a file that does not exist yet.
#[cfg(unix)]
fn target_permissions(path: &Path, _tmp: &std::fs::File) -> std::io::Result<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(std::fs::Permissions::from_mode(NEW_FILE_MODE))
        }
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn target_permissions(path: &Path, tmp: &std::fs::File) -> std::io::Result<std::fs::Permissions> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.permissions()),
        Err(_) => Ok(tmp.metadata()?.permissions()),
    }
}
