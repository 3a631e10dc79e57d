//! Questionnaire files.
//!
//! Two layouts are read and written: a flat map of questions when no groups
//! exist, and `{"questions": ..., "groups": ...}` when they do.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{read_json, write_json};
use crate::error::{QuestionnaireError, Result};
use crate::question::{Question, QuestionStore};

/// On-disk layout of a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuestionnaireFile {
    Grouped {
        questions: IndexMap<String, Question>,
        #[serde(default)]
        groups: IndexMap<String, Vec<String>>,
    },
    Flat(IndexMap<String, Question>),
}

impl QuestionnaireFile {
    /// Picks the layout for a store: grouped only when groups exist.
    pub fn from_store(store: &QuestionStore) -> Self {
        if store.has_groups() {
            Self::Grouped {
                questions: store.questions().clone(),
                groups: store.groups().clone(),
            }
        } else {
            Self::Flat(store.questions().clone())
        }
    }

    /// Interprets parsed JSON. A top-level `questions` key selects the
    /// grouped layout.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let grouped = value
            .as_object()
            .is_some_and(|map| map.contains_key("questions"));

        let parsed = if grouped {
            #[derive(Deserialize)]
            struct Grouped {
                questions: IndexMap<String, Question>,
                #[serde(default)]
                groups: IndexMap<String, Vec<String>>,
            }
            serde_json::from_value::<Grouped>(value).map(|g| Self::Grouped {
                questions: g.questions,
                groups: g.groups,
            })
        } else {
            serde_json::from_value(value).map(Self::Flat)
        };

        parsed.map_err(|e| {
            QuestionnaireError::persistence(format!("Invalid questionnaire file: {e}"))
        })
    }

    pub fn into_store(self) -> QuestionStore {
        match self {
            Self::Grouped { questions, groups } => QuestionStore::from_parts(questions, groups),
            Self::Flat(questions) => QuestionStore::from_parts(questions, IndexMap::new()),
        }
    }
}

/// Writes the store to `path`. An empty store is refused.
pub fn save_questionnaire(path: &Path, store: &QuestionStore) -> Result<()> {
    if store.is_empty() {
        return Err(QuestionnaireError::validation("No questions to save."));
    }

    write_json(path, &QuestionnaireFile::from_store(store))?;
    info!(
        "Questionnaire with {} questions saved to {}",
        store.len(),
        path.display()
    );
    Ok(())
}

/// Reads a questionnaire in either layout.
pub fn load_questionnaire(path: &Path) -> Result<QuestionStore> {
    let store = QuestionnaireFile::from_json(read_json(path)?)?.into_store();
    info!(
        "Questionnaire with {} questions loaded from {}",
        store.len(),
        path.display()
    );
    Ok(store)
}
