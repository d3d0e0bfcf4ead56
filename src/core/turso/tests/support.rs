#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::{Value as Json, json};
use tokio::sync::oneshot;

use crate::core::credentials::{CredentialDefaults, CredentialStore, Credentials};
use crate::core::turso::{
    Arg, QueryResult, SCHEMA_SQL, SqlExecutor, TursoClient, TursoError, Value,
    executable_statements,
};

pub const TEST_TOKEN: &str = "test-token";

/// In-memory SQLite standing in for the remote database.
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    pub fn open() -> Self {
        Self {
            conn: Mutex::new(Connection::open_in_memory().expect("open in-memory sqlite")),
        }
    }

    pub fn with_schema() -> Self {
        let db = Self::open();
        for sql in executable_statements(SCHEMA_SQL) {
            db.run(&sql, Vec::new()).expect("bundled schema applies");
        }
        db
    }

    pub fn exec_batch(&self, sql: &str) {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute_batch(sql).expect("fixture batch applies");
    }

    pub fn scalar_i64(&self, sql: &str) -> i64 {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(sql, [], |row| row.get(0))
            .expect("scalar query")
    }

    pub fn run(&self, sql: &str, args: Vec<SqlValue>) -> Result<QueryResult, String> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare(sql).map_err(|e| e.to_string())?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        if columns.is_empty() {
            let affected = stmt
                .execute(params_from_iter(args))
                .map_err(|e| e.to_string())?;
            return Ok(QueryResult {
                columns,
                rows: Vec::new(),
                affected_row_count: affected as u64,
            });
        }

        let mut rows = stmt
            .query(params_from_iter(args))
            .map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| e.to_string())? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(from_sql(row.get_ref(i).map_err(|e| e.to_string())?));
            }
            out.push(cells);
        }
        Ok(QueryResult {
            columns,
            rows: out,
            affected_row_count: 0,
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(x) => Value::Float(x),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn to_sql(arg: Arg) -> SqlValue {
    match arg {
        Arg::Null => SqlValue::Null,
        Arg::Integer(n) => SqlValue::Integer(n),
        Arg::Float(x) => SqlValue::Real(x),
        Arg::Text(s) => SqlValue::Text(s),
    }
}

/// Executor that skips HTTP entirely.
pub struct SqliteExecutor {
    db: SqliteDb,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl SqliteExecutor {
    pub fn new(db: SqliteDb) -> Self {
        Self {
            db,
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn db(&self) -> &SqliteDb {
        &self.db
    }

    /// Every subsequent call fails with a 503 carrying `body`, until cleared.
    pub fn set_failing(&self, body: Option<&str>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = body.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str, args: Vec<Arg>) -> Result<QueryResult, TursoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(body) = self
            .failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(TursoError::Transport { status: 503, body });
        }
        self.db
            .run(sql, args.into_iter().map(to_sql).collect())
            .map_err(|message| TursoError::Statement { index: 1, message })
    }
}

// ── Mock pipeline endpoint ──

#[derive(Clone)]
struct ServerState {
    db: Arc<SqliteDb>,
    token: String,
    requests: Arc<Mutex<Vec<Json>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
    scripted: Arc<Mutex<VecDeque<(u16, String)>>>,
}

pub struct PipelineServer {
    pub base_url: String,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

fn decode_arg(raw: &Json) -> SqlValue {
    let value = raw.get("value");
    match raw.get("type").and_then(Json::as_str) {
        Some("integer") => value
            .and_then(|v| match v {
                Json::String(s) => s.parse().ok(),
                other => other.as_i64(),
            })
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Null),
        Some("float") => value
            .and_then(Json::as_f64)
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        Some("text") => value
            .and_then(Json::as_str)
            .map(|s| SqlValue::Text(s.to_string()))
            .unwrap_or(SqlValue::Null),
        _ => SqlValue::Null,
    }
}

fn encode_cell(value: &Value) -> Json {
    match value {
        Value::Null => json!({"type": "null"}),
        Value::Integer(n) => json!({"type": "integer", "value": n.to_string()}),
        Value::Float(x) => json!({"type": "float", "value": x}),
        Value::Text(s) => json!({"type": "text", "value": s}),
        Value::Bool(b) => json!({"type": "integer", "value": (*b as i64).to_string()}),
    }
}

fn execute_step(db: &SqliteDb, stmt: &Json) -> Json {
    let sql = stmt.get("sql").and_then(Json::as_str).unwrap_or_default();
    let args = stmt
        .get("args")
        .and_then(Json::as_array)
        .map(|a| a.iter().map(decode_arg).collect())
        .unwrap_or_default();
    match db.run(sql, args) {
        Ok(result) => json!({
            "type": "ok",
            "response": {
                "type": "execute",
                "result": {
                    "cols": result.columns.iter().map(|c| json!({"name": c, "decltype": null})).collect::<Vec<_>>(),
                    "rows": result.rows.iter().map(|r| r.iter().map(encode_cell).collect::<Vec<_>>()).collect::<Vec<_>>(),
                    "affected_row_count": result.affected_row_count,
                    "last_insert_rowid": null
                }
            }
        }),
        Err(message) => json!({"type": "error", "error": {"message": message, "code": "SQLITE_ERROR"}}),
    }
}

async fn pipeline(
    State(state): State<ServerState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Json>,
) -> (StatusCode, String) {
    state
        .requests
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(body.clone());
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state
        .auth_headers
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(auth.clone());

    let scripted = state
        .scripted
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .pop_front();
    if let Some((status, body)) = scripted {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, body);
    }

    if auth != format!("Bearer {}", state.token) {
        return (StatusCode::UNAUTHORIZED, "invalid token".to_string());
    }

    let results: Vec<Json> = body
        .get("requests")
        .and_then(Json::as_array)
        .map(|requests| {
            requests
                .iter()
                .map(|req| match req.get("type").and_then(Json::as_str) {
                    Some("execute") => execute_step(&state.db, req.get("stmt").unwrap_or(&Json::Null)),
                    Some("close") => json!({"type": "ok", "response": {"type": "close"}}),
                    _ => json!({"type": "error", "error": {"message": "unknown request type"}}),
                })
                .collect()
        })
        .unwrap_or_default();

    (
        StatusCode::OK,
        json!({"baton": null, "base_url": null, "results": results}).to_string(),
    )
}

impl PipelineServer {
    pub async fn start(db: SqliteDb) -> Self {
        let state = ServerState {
            db: Arc::new(db),
            token: TEST_TOKEN.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
            auth_headers: Arc::new(Mutex::new(Vec::new())),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
        };
        let app = Router::new()
            .route("/v2/pipeline", post(pipeline))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock pipeline server");
        let port = listener.local_addr().expect("local addr").port();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn db(&self) -> &SqliteDb {
        &self.state.db
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            url: self.base_url.clone(),
            token: TEST_TOKEN.to_string(),
        }
    }

    /// Client whose build-time defaults point at this server.
    pub fn client(&self) -> TursoClient {
        let store = CredentialStore::in_memory(CredentialDefaults {
            url: Some(self.base_url.clone()),
            token: Some(TEST_TOKEN.to_string()),
        });
        TursoClient::new(Arc::new(store)).expect("build client")
    }

    /// Queues a canned response for the next request, bypassing the database.
    pub fn script(&self, status: u16, body: &str) {
        self.state
            .scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back((status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Json> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.state
            .auth_headers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Drop for PipelineServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn unconfigured_client() -> TursoClient {
    TursoClient::new(Arc::new(CredentialStore::in_memory(CredentialDefaults::default())))
        .expect("build client")
}
