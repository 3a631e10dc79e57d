//! Questionnaire and state files through the session.

use super::create_shop_db;
use db_questionnaire::config::DatabaseConfig;
use db_questionnaire::connection::ConnectionState;
use db_questionnaire::persistence::{self, AppState};
use db_questionnaire::question::QuestionDraft;
use db_questionnaire::session::Session;
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::tempdir;

fn populated_session() -> Session {
    let mut session = Session::new();
    session
        .create_question(
            QuestionDraft::new("by_region", "SELECT * FROM orders WHERE region = {r}")
                .with_description("Orders in a region")
                .with_dynamic_input("r", "region"),
        )
        .unwrap();
    session
        .create_question(QuestionDraft::new("count", "SELECT count(*) FROM orders"))
        .unwrap();
    session
        .create_question(QuestionDraft::new("notes", "SELECT note FROM orders"))
        .unwrap();
    session
}

#[test]
fn test_questionnaire_save_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("questions.json");
    let mut session = populated_session();
    session.assign_to_group("summary", "count").unwrap();

    session.save_questionnaire(&path).unwrap();

    let mut restored = Session::new();
    assert_eq!(restored.load_questionnaire(&path).unwrap(), 3);
    assert_eq!(restored.store(), session.store());
    assert_eq!(restored.store().group_of("count"), Some("summary"));
}

#[test]
fn test_flat_file_written_by_hand_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("questions.json");
    std::fs::write(
        &path,
        r#"{
  "second": {"sql": "SELECT 2", "description": "two"},
  "first": {"sql": "SELECT * FROM t WHERE a = {x}", "dynamic_inputs": {"x": "a"}}
}"#,
    )
    .unwrap();

    let mut session = Session::new();
    session.load_questionnaire(&path).unwrap();

    assert_eq!(session.store().names(), vec!["second", "first"]);
    assert!(session.store().get("first").unwrap().is_dynamic());
    assert!(!session.store().has_groups());
}

#[test]
fn test_malformed_questionnaire_leaves_store_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("questions.json");
    std::fs::write(&path, "{\"q\": ").unwrap();

    let mut session = populated_session();
    let err = session.load_questionnaire(&path).unwrap_err();

    assert_eq!(err.category(), "Persistence Error");
    assert_eq!(session.store().len(), 3);
}

#[tokio::test]
async fn test_state_round_trip_reloads_database() {
    let dir = tempdir().unwrap();
    let db_path = create_shop_db(dir.path()).await;
    let state_path = dir.path().join("state.json");

    let mut session = populated_session();
    session
        .load_database(&DatabaseConfig::for_path(&db_path))
        .await
        .unwrap();
    session.save_state(&state_path).unwrap();
    session.close().await.unwrap();

    let saved = persistence::load_state(&state_path).unwrap();
    assert_eq!(saved.db_path, db_path.display().to_string());

    let mut restored = Session::new();
    let report = restored
        .load_state(&state_path, &DatabaseConfig::default())
        .await
        .unwrap();

    assert!(report.connection_error.is_none());
    assert_eq!(report.questions, 3);
    assert_eq!(restored.connection_state(), ConnectionState::Loaded);
    assert_eq!(restored.database_path(), Some(db_path.as_path()));
    restored.close().await.unwrap();
}

#[tokio::test]
async fn test_state_with_empty_db_path_loads_questions_only() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let session = populated_session();
    persistence::save_state(&state_path, &AppState::new(None, session.store())).unwrap();

    let mut restored = Session::new();
    let report = restored
        .load_state(&state_path, &DatabaseConfig::default())
        .await
        .unwrap();

    assert_eq!(report.questions, 3);
    assert!(report.connection_error.is_some());
    assert_eq!(restored.connection_state(), ConnectionState::Unloaded);
}

#[tokio::test]
async fn test_state_while_other_database_loaded_reports_conflict() {
    let dir = tempdir().unwrap();
    let first = create_shop_db(dir.path()).await;
    let state_path = dir.path().join("state.json");
    let session = populated_session();
    persistence::save_state(
        &state_path,
        &AppState::new(Some(Path::new("/elsewhere/other.db")), session.store()),
    )
    .unwrap();

    let mut restored = Session::new();
    restored
        .load_database(&DatabaseConfig::for_path(&first))
        .await
        .unwrap();
    let report = restored
        .load_state(&state_path, &DatabaseConfig::default())
        .await
        .unwrap();

    assert!(report.connection_error.is_some());
    assert_eq!(restored.database_path(), Some(first.as_path()));
    assert_eq!(restored.store().len(), 3);
    restored.close().await.unwrap();
}
