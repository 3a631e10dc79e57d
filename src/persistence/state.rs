//! Application state files: the loaded database path plus the questionnaire.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{read_json, write_json};
use crate::error::Result;
use crate::question::{Question, QuestionStore};

/// Saved session: which database was open and which questions were defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Database file path, empty when no database was loaded.
    #[serde(default)]
    pub db_path: String,

    #[serde(default)]
    pub questions: IndexMap<String, Question>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub groups: IndexMap<String, Vec<String>>,
}

impl AppState {
    pub fn new(db_path: Option<&Path>, store: &QuestionStore) -> Self {
        Self {
            db_path: db_path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            questions: store.questions().clone(),
            groups: store.groups().clone(),
        }
    }

    pub fn into_store(self) -> QuestionStore {
        QuestionStore::from_parts(self.questions, self.groups)
    }
}

pub fn save_state(path: &Path, state: &AppState) -> Result<()> {
    write_json(path, state)?;
    info!(
        "State with {} questions saved to {}",
        state.questions.len(),
        path.display()
    );
    Ok(())
}

pub fn load_state(path: &Path) -> Result<AppState> {
    let state: AppState = read_json(path)?;
    info!(
        "State with {} questions loaded from {}",
        state.questions.len(),
        path.display()
    );
    Ok(state)
}
