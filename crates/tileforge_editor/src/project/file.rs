//! Project file save/load operations

use std::path::Path;
use tileforge_core::ProjectFile;

use crate::EditorError;

/// Load a project document from a JSON file
pub fn read_project(path: &Path) -> Result<ProjectFile, EditorError> {
    let content = std::fs::read_to_string(path).map_err(|e| EditorError::Io(e.to_string()))?;

    let project = ProjectFile::from_json(&content)?;
    log::info!("Loaded project from {:?}", path);
    Ok(project)
}

/// Save a project document as pretty-printed JSON
pub fn write_project(path: &Path, project: &ProjectFile) -> Result<(), EditorError> {
    let content = project
        .to_json_pretty()
        .map_err(|e| EditorError::Encode(e.to_string()))?;

    write_bytes(path, content.as_bytes())?;
    log::info!("Saved project to {:?}", path);
    Ok(())
}

/// Write raw bytes, creating the parent directory if needed
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), EditorError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| EditorError::Io(e.to_string()))?;
    }
    std::fs::write(path, bytes).map_err(|e| EditorError::Io(e.to_string()))
}
