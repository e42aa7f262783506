//! Project persistence: files on disk and the autosave slot

mod file;

pub use file::{read_project, write_bytes, write_project};

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tileforge_core::ProjectFile;

use crate::EditorError;

/// Name of the single autosave slot
pub const AUTOSAVE_KEY: &str = "tileforge_autosave";

/// One-slot autosave store backed by a JSON file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autosave {
    path: PathBuf,
}

impl Autosave {
    /// Autosave to an explicit file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Autosave file in the platform data directory, if one can be determined
    pub fn default_location() -> Option<Self> {
        ProjectDirs::from("com", "tileforge", "tileforge")
            .map(|dirs| Self::new(dirs.data_dir().join(format!("{AUTOSAVE_KEY}.json"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot with `project`
    pub fn save(&self, project: &ProjectFile) -> Result<(), EditorError> {
        let content = project
            .to_json_pretty()
            .map_err(|e| EditorError::Encode(e.to_string()))?;
        write_bytes(&self.path, content.as_bytes()).map_err(|e| match e {
            EditorError::Io(msg) => EditorError::StorageUnavailable(msg),
            other => other,
        })?;
        log::debug!("Autosaved to {:?}", self.path);
        Ok(())
    }

    /// Read the slot. Returns `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<ProjectFile>, EditorError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EditorError::StorageUnavailable(e.to_string())),
        };
        Ok(Some(ProjectFile::from_json(&content)?))
    }

    /// Delete the slot; a missing file is not an error
    pub fn clear(&self) -> Result<(), EditorError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EditorError::StorageUnavailable(e.to_string())),
        }
    }
}
