//! Input resolution and question execution against a real SQLite file.

use super::create_shop_db;
use db_questionnaire::config::DatabaseConfig;
use db_questionnaire::db::{DatabaseClient, SqliteClient, Value};
use db_questionnaire::query::{
    InputPrompt, InputRequest, InputResolver, PresetInputs, QueryRunner, Resolution,
};
use db_questionnaire::question::{QuestionDraft, QuestionStore};
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

async fn shop_client() -> (SqliteClient, TempDir) {
    let dir = tempdir().unwrap();
    let path = create_shop_db(dir.path()).await;
    let client = SqliteClient::connect(&DatabaseConfig::for_path(path))
        .await
        .unwrap();
    (client, dir)
}

fn shop_store() -> QuestionStore {
    let mut store = QuestionStore::new();
    store
        .add(QuestionDraft::new("missing table", "SELECT * FROM nope"))
        .unwrap();
    store
        .add(
            QuestionDraft::new(
                "orders in region",
                "SELECT id, amount FROM orders WHERE region = {r} ORDER BY id",
            )
            .with_description("Orders for one region")
            .with_dynamic_input("r", "region"),
        )
        .unwrap();
    store
        .add(QuestionDraft::new(
            "all orders",
            "SELECT id, region, amount, note FROM orders ORDER BY id",
        ))
        .unwrap();
    store
}

/// Answers every request with the same value and remembers what it saw.
struct Recording {
    value: String,
    lookup_errors: Vec<Option<String>>,
}

impl InputPrompt for Recording {
    fn prompt(&mut self, request: &InputRequest<'_>) -> Option<String> {
        self.lookup_errors.push(request.lookup_error.clone());
        Some(self.value.clone())
    }
}

#[tokio::test]
async fn test_invalid_question_does_not_stop_later_ones() {
    let (client, _dir) = shop_client().await;
    let store = shop_store();

    let report = QueryRunner::new(&client)
        .run_batch(
            &store,
            &["missing table".to_string(), "all orders".to_string()],
            &mut PresetInputs::new(),
        )
        .await
        .unwrap();

    let failed = &report.results[0];
    assert!(failed.is_error());
    assert_eq!(failed.table.column_names(), vec!["Error"]);
    assert_eq!(failed.table.rows.len(), 1);
    assert_eq!(
        failed.table.rows[0][0],
        Value::from("Error executing query for question 'missing table':\nno such table: nope")
    );

    let all = &report.results[1];
    assert!(!all.is_error());
    assert_eq!(all.table.column_names(), vec!["id", "region", "amount", "note"]);
    assert_eq!(
        all.table.rows[1],
        vec![
            Value::Int(2),
            Value::from("south"),
            Value::Float(20.0),
            Value::from("gift")
        ]
    );
    assert_eq!(all.table.rows[0][3], Value::Null);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_placeholder_template_falls_back_to_free_form() {
    let (client, _dir) = shop_client().await;
    let store = shop_store();
    let mut prompt = Recording {
        value: "north".to_string(),
        lookup_errors: Vec::new(),
    };

    let report = QueryRunner::new(&client)
        .run_batch(&store, &["orders in region".to_string()], &mut prompt)
        .await
        .unwrap();

    // The raw template still holds `{r}`, which SQLite cannot parse.
    assert!(prompt.lookup_errors[0].is_some());

    let result = &report.results[0];
    assert_eq!(
        result.sql,
        "SELECT id, amount FROM orders WHERE region = 'north' ORDER BY id"
    );
    assert_eq!(
        result.table.rows,
        vec![
            vec![Value::Int(1), Value::Float(10.5)],
            vec![Value::Int(3), Value::Float(7.25)]
        ]
    );
    assert_eq!(result.inputs, vec![("r".to_string(), "north".to_string())]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_quoted_value_is_data_not_sql() {
    let (client, _dir) = shop_client().await;
    let store = shop_store();
    let mut prompt = PresetInputs::new().with("r", "north' OR '1'='1");

    let report = QueryRunner::new(&client)
        .run_batch(&store, &["orders in region".to_string()], &mut prompt)
        .await
        .unwrap();

    let result = &report.results[0];
    assert!(!result.is_error());
    assert!(result.table.rows.is_empty());
    assert_eq!(result.table.column_names(), vec!["id", "amount"]);
    assert_eq!(
        result.sql,
        "SELECT id, amount FROM orders WHERE region = 'north'' OR ''1''=''1' ORDER BY id"
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_candidates_listed_when_template_parses() {
    let (client, _dir) = shop_client().await;
    let store = {
        let mut store = QuestionStore::new();
        store
            .add(
                QuestionDraft::new(
                    "regions",
                    "SELECT region FROM orders /* {r} */ ORDER BY region",
                )
                .with_dynamic_input("r", "region"),
            )
            .unwrap();
        store
    };

    let question = store.get("regions").unwrap();
    let mut candidates = InputResolver::new(&client)
        .candidates(question, "region")
        .await
        .unwrap();
    candidates.sort();
    assert_eq!(candidates, vec!["north".to_string(), "south".to_string()]);

    let resolution = InputResolver::new(&client)
        .resolve("regions", question, &mut PresetInputs::new().with("r", "south"))
        .await
        .unwrap();
    assert!(matches!(resolution, Resolution::Resolved(_)));

    client.close().await.unwrap();
}
