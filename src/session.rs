//! Session orchestrator.
//!
//! Owns the question store, the database connection and the results of the
//! last run. Every front end drives the system through a [`Session`].

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{QuestionnaireError, Result};
use crate::persistence::{self, AppState};
use crate::query::{InputPrompt, QueryRunner, QuestionResult, RunReport};
use crate::question::{Question, QuestionDraft, QuestionStore};

/// Where a materialized re-run is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialize {
    /// Overwrite the question that was run.
    Replace,
    /// Store under a new name, leaving the original untouched.
    Copy { name: String },
}

/// Outcome of loading a state file.
///
/// The questions load even when the stored database cannot be opened; the
/// connection failure is returned here instead of failing the whole load.
#[derive(Debug)]
pub struct StateLoadReport {
    pub questions: usize,
    pub db_path: Option<PathBuf>,
    pub connection_error: Option<QuestionnaireError>,
}

/// The application session.
#[derive(Default)]
pub struct Session {
    connection: ConnectionManager,
    store: QuestionStore,
    results: Vec<QuestionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session around an existing connection manager.
    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            ..Default::default()
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.connection.path()
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    /// Results of the last run, in run order.
    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    pub async fn load_database(&mut self, config: &DatabaseConfig) -> Result<()> {
        self.connection.load(config).await
    }

    /// Closes the database. Returns false if none was loaded.
    pub async fn unload_database(&mut self) -> Result<bool> {
        self.connection.unload().await
    }

    /// Validates and stores a new question. Returns its name.
    pub fn create_question(&mut self, draft: QuestionDraft) -> Result<String> {
        self.store.add(draft)
    }

    pub fn remove_question(&mut self, name: &str) -> Result<Question> {
        self.store
            .remove(name)
            .ok_or_else(|| QuestionnaireError::validation(format!("Unknown question '{name}'.")))
    }

    pub fn question_details(&self, name: &str) -> Result<String> {
        Ok(self.store.require(name)?.details(name))
    }

    pub fn assign_to_group(&mut self, group: &str, name: &str) -> Result<()> {
        self.store.assign_to_group(group, name)
    }

    pub fn ungroup(&mut self, name: &str) -> Result<bool> {
        self.store.require(name)?;
        Ok(self.store.ungroup(name))
    }

    /// Deletes a group. Returns the questions it held, which stay in the store.
    pub fn remove_group(&mut self, group: &str) -> Result<Vec<String>> {
        self.store
            .remove_group(group)
            .ok_or_else(|| QuestionnaireError::validation(format!("Unknown group '{group}'.")))
    }

    /// Names of a group's members, for running a whole group.
    pub fn group_members(&self, group: &str) -> Result<Vec<String>> {
        self.store
            .group_members(group)
            .map(<[String]>::to_vec)
            .ok_or_else(|| QuestionnaireError::validation(format!("Unknown group '{group}'.")))
    }

    /// Runs the named questions, replacing the previous results.
    pub async fn run_questions(
        &mut self,
        names: &[String],
        prompt: &mut dyn InputPrompt,
    ) -> Result<RunReport> {
        let db = self.connection.require_db()?;
        self.results.clear();

        let report = QueryRunner::new(db)
            .run_batch(&self.store, names, prompt)
            .await?;

        info!(
            "Ran {} of {} questions ({} errors)",
            report.results.len(),
            names.len(),
            report.error_count()
        );
        self.results = report.results.clone();
        Ok(report)
    }

    /// Saves the last successful run of `name` back into the store with its
    /// input values baked into the SQL. Returns the name it was stored under.
    pub fn materialize_result(&mut self, name: &str, target: Materialize) -> Result<String> {
        let result = self
            .results
            .iter()
            .rev()
            .find(|r| r.question == name)
            .ok_or_else(|| {
                QuestionnaireError::validation(format!("No result for question '{name}'."))
            })?;

        if result.is_error() {
            return Err(QuestionnaireError::validation(format!(
                "Cannot save the failed run of '{name}'."
            )));
        }

        let materialized = self.store.require(name)?.materialize(&result.inputs);

        let stored_as = match target {
            Materialize::Replace => name.to_string(),
            Materialize::Copy { name: new_name } => {
                let new_name = new_name.trim().to_string();
                if new_name.is_empty() {
                    return Err(QuestionnaireError::validation("Question name is required."));
                }
                if self.store.contains(&new_name) {
                    return Err(QuestionnaireError::validation(format!(
                        "Question '{new_name}' already exists."
                    )));
                }
                new_name
            }
        };

        self.store.insert(stored_as.clone(), materialized);
        info!("Saved run of '{}' as '{}'", name, stored_as);
        Ok(stored_as)
    }

    pub fn save_questionnaire(&self, path: &Path) -> Result<()> {
        persistence::save_questionnaire(path, &self.store)
    }

    /// Replaces the store with a questionnaire file. Returns the question count.
    pub fn load_questionnaire(&mut self, path: &Path) -> Result<usize> {
        self.store = persistence::load_questionnaire(path)?;
        self.results.clear();
        Ok(self.store.len())
    }

    pub fn save_state(&self, path: &Path) -> Result<()> {
        persistence::save_state(path, &AppState::new(self.database_path(), &self.store))
    }

    /// Replaces the store from a state file and loads its database.
    ///
    /// `defaults` supplies connection options other than the path.
    pub async fn load_state(
        &mut self,
        path: &Path,
        defaults: &DatabaseConfig,
    ) -> Result<StateLoadReport> {
        let state = persistence::load_state(path)?;
        let db_path = (!state.db_path.is_empty()).then(|| PathBuf::from(&state.db_path));

        self.store = state.into_store();
        self.results.clear();

        let connection_error = match &db_path {
            None => Some(QuestionnaireError::connection(
                "State file does not name a database.",
            )),
            Some(db_path) if self.database_path() == Some(db_path.as_path()) => None,
            Some(db_path) => {
                let config = DatabaseConfig {
                    path: Some(db_path.clone()),
                    read_only: defaults.read_only,
                };
                self.connection.load(&config).await.err()
            }
        };

        if let Some(e) = &connection_error {
            warn!("Database from state file not loaded: {e}");
        }

        Ok(StateLoadReport {
            questions: self.store.len(),
            db_path,
            connection_error,
        })
    }

    /// Closes the database if one is loaded.
    pub async fn close(&mut self) -> Result<()> {
        self.connection.unload().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockDatabaseClient;
    use crate::query::PresetInputs;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn mock_session() -> Session {
        let db = MockDatabaseClient::new()
            .with_error("SELECT * FROM missing", "no such table: missing")
            .with_error(
                "SELECT DISTINCT region FROM (SELECT * FROM orders WHERE region = {r})",
                "unrecognized token: \"{\"",
            );
        let mut session =
            Session::with_connection(ConnectionManager::with_connection(Box::new(db), "mock.db"));
        session
            .create_question(
                QuestionDraft::new("by_region", "SELECT * FROM orders WHERE region = {r}")
                    .with_description("Orders in a region")
                    .with_dynamic_input("r", "region"),
            )
            .unwrap();
        session
            .create_question(QuestionDraft::new("broken", "SELECT * FROM missing"))
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_run_requires_loaded_database() {
        let mut session = Session::new();
        session
            .create_question(QuestionDraft::new("q", "SELECT 1"))
            .unwrap();

        let err = session
            .run_questions(&["q".to_string()], &mut PresetInputs::new())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Please load a database first.");
    }

    #[tokio::test]
    async fn test_run_replaces_previous_results() {
        let mut session = mock_session();
        let mut prompt = PresetInputs::new().with("r", "north");

        session
            .run_questions(&["by_region".to_string(), "broken".to_string()], &mut prompt)
            .await
            .unwrap();
        assert_eq!(session.results().len(), 2);

        session
            .run_questions(&["broken".to_string()], &mut prompt)
            .await
            .unwrap();
        let labels: Vec<String> = session.results().iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["broken (Error)"]);
    }

    #[tokio::test]
    async fn test_unload_makes_runs_fail() {
        let mut session = mock_session();
        assert!(session.unload_database().await.unwrap());
        assert_eq!(session.connection_state(), ConnectionState::Unloaded);

        let err = session
            .run_questions(&["broken".to_string()], &mut PresetInputs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QuestionnaireError::Connection(_)));
    }

    #[tokio::test]
    async fn test_materialize_copy_and_replace() {
        let mut session = mock_session();
        session
            .run_questions(
                &["by_region".to_string()],
                &mut PresetInputs::new().with("r", "north"),
            )
            .await
            .unwrap();

        let copy = session
            .materialize_result(
                "by_region",
                Materialize::Copy {
                    name: "north orders".to_string(),
                },
            )
            .unwrap();
        assert_eq!(copy, "north orders");
        let frozen = session.store().get("north orders").unwrap();
        assert_eq!(frozen.sql, "SELECT * FROM orders WHERE region = 'north'");
        assert!(!frozen.is_dynamic());
        assert!(session.store().get("by_region").unwrap().is_dynamic());

        let err = session
            .materialize_result(
                "by_region",
                Materialize::Copy {
                    name: "north orders".to_string(),
                },
            )
            .unwrap_err();
        assert!(err.message().contains("already exists"));

        session
            .materialize_result("by_region", Materialize::Replace)
            .unwrap();
        assert!(!session.store().get("by_region").unwrap().is_dynamic());
        assert_eq!(session.store().names(), vec!["by_region", "broken", "north orders"]);
    }

    #[tokio::test]
    async fn test_materialize_refuses_failed_run() {
        let mut session = mock_session();
        session
            .run_questions(&["broken".to_string()], &mut PresetInputs::new())
            .await
            .unwrap();

        assert!(session
            .materialize_result("broken", Materialize::Replace)
            .is_err());
        assert!(session
            .materialize_result("by_region", Materialize::Replace)
            .is_err());
    }

    #[test]
    fn test_remove_and_details() {
        let mut session = Session::new();
        session
            .create_question(QuestionDraft::new("q", "SELECT 1").with_description("one"))
            .unwrap();

        assert!(session.question_details("q").unwrap().contains("Description: one"));
        assert!(session.remove_question("q").is_ok());
        assert!(session.remove_question("q").is_err());
        assert!(session.question_details("q").is_err());
    }

    #[test]
    fn test_group_members_unknown_group() {
        let session = Session::new();
        assert_eq!(
            session.group_members("nope").unwrap_err().message(),
            "Unknown group 'nope'."
        );
    }

    #[test]
    fn test_remove_group_leaves_questions_ungrouped() {
        let mut session = mock_session();
        session.assign_to_group("sales", "by_region").unwrap();

        assert_eq!(
            session.remove_group("sales").unwrap(),
            vec!["by_region".to_string()]
        );
        assert!(!session.store().has_groups());
        assert!(session.store().contains("by_region"));
        assert_eq!(
            session.remove_group("sales").unwrap_err().message(),
            "Unknown group 'sales'."
        );
    }

    #[tokio::test]
    async fn test_load_state_keeps_questions_when_database_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let missing_db = dir.path().join("gone.db");

        let mut source = Session::new();
        source
            .create_question(QuestionDraft::new("q", "SELECT 1"))
            .unwrap();
        let state = AppState::new(Some(missing_db.as_path()), source.store());
        persistence::save_state(&path, &state).unwrap();

        let mut session = Session::new();
        let report = session
            .load_state(&path, &DatabaseConfig::default())
            .await
            .unwrap();

        assert_eq!(report.questions, 1);
        assert_eq!(report.db_path.as_deref(), Some(missing_db.as_path()));
        assert_eq!(
            report.connection_error.unwrap().message(),
            "Database file not found."
        );
        assert!(session.store().contains("q"));
        assert_eq!(session.connection_state(), ConnectionState::Unloaded);
    }

    #[tokio::test]
    async fn test_load_state_same_database_keeps_connection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut session = mock_session();
        session.save_state(&path).unwrap();
        session.remove_question("broken").unwrap();

        let report = session
            .load_state(&path, &DatabaseConfig::default())
            .await
            .unwrap();

        assert!(report.connection_error.is_none());
        assert_eq!(report.questions, 2);
        assert_eq!(session.database_path(), Some(Path::new("mock.db")));
    }
}
