//! End-to-end session flows against a real SQLite file.

use super::create_shop_db;
use db_questionnaire::config::DatabaseConfig;
use db_questionnaire::connection::ConnectionState;
use db_questionnaire::db::Value;
use db_questionnaire::query::PresetInputs;
use db_questionnaire::question::QuestionDraft;
use db_questionnaire::session::{Materialize, Session};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[tokio::test]
async fn test_define_run_materialize_save() {
    let dir = tempdir().unwrap();
    let db_path = create_shop_db(dir.path()).await;
    let questions_path = dir.path().join("questions.json");

    let mut session = Session::new();
    session
        .load_database(&DatabaseConfig::for_path(&db_path))
        .await
        .unwrap();
    session
        .create_question(
            QuestionDraft::new(
                "total for region",
                "SELECT sum(amount) AS total FROM orders WHERE region = {r}",
            )
            .with_dynamic_inputs_text("r|region")
            .unwrap(),
        )
        .unwrap();

    let report = session
        .run_questions(
            &["total for region".to_string()],
            &mut PresetInputs::new().with("r", "north"),
        )
        .await
        .unwrap();
    assert_eq!(report.results[0].table.rows, vec![vec![Value::Float(17.75)]]);
    assert_eq!(session.results().len(), 1);

    session
        .materialize_result(
            "total for region",
            Materialize::Copy {
                name: "north total".to_string(),
            },
        )
        .unwrap();
    session.save_questionnaire(&questions_path).unwrap();
    session.close().await.unwrap();

    let mut reopened = Session::new();
    reopened.load_questionnaire(&questions_path).unwrap();
    reopened
        .load_database(&DatabaseConfig::for_path(&db_path))
        .await
        .unwrap();

    let report = reopened
        .run_questions(&["north total".to_string()], &mut PresetInputs::new())
        .await
        .unwrap();
    assert_eq!(
        report.results[0].sql,
        "SELECT sum(amount) AS total FROM orders WHERE region = 'north'"
    );
    assert_eq!(report.results[0].table.rows, vec![vec![Value::Float(17.75)]]);
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn test_unload_blocks_runs_until_reload() {
    let dir = tempdir().unwrap();
    let db_path = create_shop_db(dir.path()).await;
    let config = DatabaseConfig::for_path(&db_path);

    let mut session = Session::new();
    session
        .create_question(QuestionDraft::new("count", "SELECT count(*) FROM orders"))
        .unwrap();
    session.load_database(&config).await.unwrap();
    session.unload_database().await.unwrap();

    let err = session
        .run_questions(&["count".to_string()], &mut PresetInputs::new())
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Please load a database first.");
    assert_eq!(session.connection_state(), ConnectionState::Unloaded);

    session.load_database(&config).await.unwrap();
    let report = session
        .run_questions(&["count".to_string()], &mut PresetInputs::new())
        .await
        .unwrap();
    assert_eq!(report.results[0].table.rows, vec![vec![Value::Int(3)]]);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_cancelled_input_keeps_earlier_results() {
    let dir = tempdir().unwrap();
    let db_path = create_shop_db(dir.path()).await;

    let mut session = Session::new();
    session
        .load_database(&DatabaseConfig::for_path(&db_path))
        .await
        .unwrap();
    session
        .create_question(QuestionDraft::new("count", "SELECT count(*) FROM orders"))
        .unwrap();
    session
        .create_question(
            QuestionDraft::new("by_id", "SELECT * FROM orders WHERE id = {id}")
                .with_dynamic_input("id", "id"),
        )
        .unwrap();

    let report = session
        .run_questions(
            &["count".to_string(), "by_id".to_string()],
            &mut PresetInputs::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.cancelled.as_ref().unwrap().question, "by_id");
    assert_eq!(session.results().len(), 1);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_rejected_drafts_never_reach_the_store() {
    let mut session = Session::new();

    let cases = [
        QuestionDraft::new("", "SELECT 1"),
        QuestionDraft::new("drop", "DROP TABLE orders"),
        QuestionDraft::new("unused", "SELECT 1").with_dynamic_input("x", "a"),
        QuestionDraft::new("stacked", "SELECT 1; DELETE FROM orders"),
    ];
    for draft in cases {
        assert!(session.create_question(draft).is_err());
    }

    assert!(session.store().is_empty());
}
