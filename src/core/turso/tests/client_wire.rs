use serde_json::json;

use super::support::{PipelineServer, SqliteDb, TEST_TOKEN, unconfigured_client};
use crate::core::credentials::Credentials;
use crate::core::turso::{Arg, Statement, StepResult, TursoError, Value, to_rows};

#[tokio::test]
async fn execute_sends_one_statement_then_close_with_bearer_auth() {
    let server = PipelineServer::start(SqliteDb::with_schema()).await;
    let client = server.client();

    let result = client
        .execute(
            "SELECT name, emoji FROM agents WHERE id = ?",
            vec![Arg::from("max")],
            None,
        )
        .await
        .unwrap();
    let rows = to_rows(&result);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_str("name"), Some("Max"));
    assert_eq!(rows[0].get_str("emoji"), Some("🧠"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        json!({
            "requests": [
                {
                    "type": "execute",
                    "stmt": {
                        "sql": "SELECT name, emoji FROM agents WHERE id = ?",
                        "args": [{"type": "text", "value": "max"}]
                    }
                },
                {"type": "close"}
            ]
        })
    );
    assert_eq!(server.auth_headers(), vec![format!("Bearer {}", TEST_TOKEN)]);
}

#[tokio::test]
async fn tagged_cells_come_back_typed() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    let result = server
        .client()
        .execute(
            "SELECT ? AS n, ? AS ratio, ? AS missing, ? AS label",
            vec![
                Arg::from(7i64),
                Arg::from(0.5),
                Arg::Null,
                Arg::from("ops"),
            ],
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["n", "ratio", "missing", "label"]);
    assert_eq!(
        result.rows[0],
        vec![
            Value::Integer(7),
            Value::Float(0.5),
            Value::Null,
            Value::Text("ops".to_string()),
        ]
    );
}

#[tokio::test]
async fn non_success_status_is_a_transport_error_with_body() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    server.script(500, "upstream exploded");

    let err = server
        .client()
        .execute("SELECT 1", Vec::new(), None)
        .await
        .unwrap_err();
    match err {
        TursoError::Transport { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(
        format!(
            "{}",
            TursoError::Transport {
                status: 500,
                body: "upstream exploded".to_string()
            }
        ),
        "Turso HTTP error 500: upstream exploded"
    );
}

#[tokio::test]
async fn wrong_token_is_rejected_by_the_server() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    let bad = Credentials {
        url: server.base_url.clone(),
        token: "nope".to_string(),
    };

    let err = server
        .client()
        .execute("SELECT 1", Vec::new(), Some(&bad))
        .await
        .unwrap_err();
    assert!(matches!(err, TursoError::Transport { status: 401, .. }));
    assert_eq!(server.auth_headers(), vec!["Bearer nope".to_string()]);
}

#[tokio::test]
async fn unexpected_response_shapes_are_protocol_errors() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    let client = server.client();

    server.script(200, "{}");
    let err = client.execute("SELECT 1", Vec::new(), None).await.unwrap_err();
    assert!(matches!(err, TursoError::Protocol(_)), "got {:?}", err);

    server.script(200, "<html>gateway</html>");
    let err = client.execute("SELECT 1", Vec::new(), None).await.unwrap_err();
    assert!(matches!(err, TursoError::Protocol(_)), "got {:?}", err);

    server.script(200, r#"{"results":[{"type":"ok","response":{"type":"execute"}}]}"#);
    let err = client.execute("SELECT 1", Vec::new(), None).await.unwrap_err();
    assert!(matches!(err, TursoError::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn failed_step_reports_statement_one() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    let err = server
        .client()
        .execute("SELECT * FROM nowhere", Vec::new(), None)
        .await
        .unwrap_err();
    match err {
        TursoError::Statement { index, message } => {
            assert_eq!(index, 1);
            assert!(message.contains("no such table"), "message: {}", message);
        }
        other => panic!("expected statement error, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let client = unconfigured_client();
    let err = client.execute("SELECT 1", Vec::new(), None).await.unwrap_err();
    assert!(err.is_configuration());

    let err = client
        .pipeline(&[Statement::new("SELECT 1")], None)
        .await
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn saved_credentials_apply_to_the_next_call() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    let client = unconfigured_client();
    assert!(client.execute("SELECT 1", Vec::new(), None).await.is_err());
    assert!(server.requests().is_empty());

    client
        .credentials()
        .save(&format!("{}/", server.base_url), TEST_TOKEN)
        .unwrap();
    let result = client.execute("SELECT 1 AS one", Vec::new(), None).await.unwrap();
    assert_eq!(result.rows[0][0], Value::Integer(1));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn pipeline_returns_one_result_per_statement_in_order() {
    let server = PipelineServer::start(SqliteDb::open()).await;
    let statements = vec![
        Statement::new("CREATE TABLE notes(body TEXT)"),
        Statement::new("CREATE TABLE notes(body TEXT)"),
        Statement::with_args("INSERT INTO notes VALUES (?)", vec![Arg::from("hi")]),
    ];

    let results = server
        .client()
        .pipeline(&statements, Some(&server.credentials()))
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(matches!(results[0], StepResult::Ok(_)));
    match &results[1] {
        StepResult::Error(message) => assert!(message.contains("already exists")),
        other => panic!("expected error step, got {:?}", other),
    }
    match &results[2] {
        StepResult::Ok(Some(result)) => assert_eq!(result.affected_row_count, 1),
        other => panic!("expected ok step, got {:?}", other),
    }

    let sent = &server.requests()[0]["requests"];
    assert_eq!(sent.as_array().map(Vec::len), Some(4));
    assert_eq!(sent[3], json!({"type": "close"}));
}
