//! Persistence layer for db-questionnaire.
//!
//! Questionnaires and session state are stored as pretty-printed JSON files.
//! Nothing beyond the shape of the file is validated on load.

mod questionnaire;
mod state;

pub use questionnaire::{load_questionnaire, save_questionnaire, QuestionnaireFile};
pub use state::{load_state, save_state, AppState};

use crate::error::{QuestionnaireError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Serializes `value` with two-space indentation and writes it to `path`,
/// creating parent directories as needed.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dirs(path)?;

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| QuestionnaireError::persistence(format!("Failed to serialize: {e}")))?;

    std::fs::write(path, json).map_err(|e| {
        QuestionnaireError::persistence(format!("Failed to write {}: {e}", path.display()))
    })?;

    info!("Saved {}", path.display());
    Ok(())
}

/// Reads and deserializes a JSON file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        QuestionnaireError::persistence(format!("Failed to read {}: {e}", path.display()))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        QuestionnaireError::persistence(format!("Invalid JSON in {}: {e}", path.display()))
    })
}

fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            QuestionnaireError::persistence(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}
