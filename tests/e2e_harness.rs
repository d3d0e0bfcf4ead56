#![allow(dead_code)]

use axum::{Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const MOCK_TOKEN: &str = "e2e-token";

/// Result of one invocation of the binary.
#[derive(Debug)]
pub struct CliOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn json(&self) -> TestResult<Value> {
        serde_json::from_str(&self.stdout)
            .map_err(|e| format!("stdout is not JSON ({}): {}", e, self.stdout).into())
    }
}

/// Runs the binary against an isolated data directory.
pub struct CliHarness {
    data_dir: LocalTempDir,
}

impl CliHarness {
    pub fn new() -> TestResult<Self> {
        Ok(Self {
            data_dir: LocalTempDir::new("mission-control-e2e")?,
        })
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.data_dir.path().join("credentials.json")
    }

    pub async fn run(&self, args: &[&str]) -> TestResult<CliOutput> {
        let output = tokio::process::Command::new(binary_path())
            .args(args)
            .env("MISSION_CONTROL_DATA_DIR", self.data_dir.path())
            .env_remove("MISSION_CONTROL_LOG")
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(Duration::from_secs(30), output)
            .await
            .map_err(|_| format!("mission-control {:?} timed out", args))??;
        Ok(CliOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs `setup` non-interactively against `server`.
    pub async fn setup(&self, server: &MockTurso) -> TestResult<CliOutput> {
        self.run(&[
            "setup",
            "--url",
            &server.base_url(),
            "--token",
            MOCK_TOKEN,
        ])
        .await
    }
}

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mission-control"))
}

// ── Mock pipeline endpoint backed by in-memory SQLite ──

#[derive(Clone)]
struct MockState {
    conn: Arc<Mutex<Connection>>,
    requests: Arc<Mutex<usize>>,
}

pub struct MockTurso {
    pub port: u16,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

fn decode_arg(raw: &Value) -> SqlValue {
    let value = raw.get("value");
    match raw.get("type").and_then(Value::as_str) {
        Some("integer") => value
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Null),
        Some("float") => value
            .and_then(Value::as_f64)
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        Some("text") => value
            .and_then(Value::as_str)
            .map(|s| SqlValue::Text(s.to_string()))
            .unwrap_or(SqlValue::Null),
        _ => SqlValue::Null,
    }
}

fn encode_cell(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => json!({"type": "null"}),
        ValueRef::Integer(n) => json!({"type": "integer", "value": n.to_string()}),
        ValueRef::Real(x) => json!({"type": "float", "value": x}),
        ValueRef::Text(b) | ValueRef::Blob(b) => {
            json!({"type": "text", "value": String::from_utf8_lossy(b)})
        }
    }
}

fn execute(conn: &Connection, stmt: &Value) -> Result<Value, rusqlite::Error> {
    let sql = stmt.get("sql").and_then(Value::as_str).unwrap_or_default();
    let args: Vec<SqlValue> = stmt
        .get("args")
        .and_then(Value::as_array)
        .map(|a| a.iter().map(decode_arg).collect())
        .unwrap_or_default();

    let mut prepared = conn.prepare(sql)?;
    let cols: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    if cols.is_empty() {
        let affected = prepared.execute(params_from_iter(args))?;
        return Ok(json!({"cols": [], "rows": [], "affected_row_count": affected}));
    }

    let mut rows = prepared.query(params_from_iter(args))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(cols.len());
        for i in 0..cols.len() {
            cells.push(encode_cell(row.get_ref(i)?));
        }
        out.push(Value::Array(cells));
    }
    Ok(json!({
        "cols": cols.iter().map(|c| json!({"name": c})).collect::<Vec<_>>(),
        "rows": out,
        "affected_row_count": 0
    }))
}

async fn pipeline(
    State(state): State<MockState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> (StatusCode, String) {
    *state.requests.lock().unwrap_or_else(|e| e.into_inner()) += 1;

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("Bearer {}", MOCK_TOKEN) {
        return (StatusCode::UNAUTHORIZED, "invalid token".to_string());
    }

    let conn = state.conn.lock().unwrap_or_else(|e| e.into_inner());
    let results: Vec<Value> = body
        .get("requests")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|req| match req.get("type").and_then(Value::as_str) {
            Some("execute") => match execute(&conn, req.get("stmt").unwrap_or(&Value::Null)) {
                Ok(result) => json!({"type": "ok", "response": {"type": "execute", "result": result}}),
                Err(e) => json!({"type": "error", "error": {"message": e.to_string()}}),
            },
            _ => json!({"type": "ok", "response": {"type": "close"}}),
        })
        .collect();

    (StatusCode::OK, json!({ "results": results }).to_string())
}

impl MockTurso {
    pub async fn start() -> TestResult<Self> {
        let port = find_free_port()?;
        let state = MockState {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            requests: Arc::new(Mutex::new(0)),
        };
        let app = Router::new()
            .route("/v2/pipeline", post(pipeline))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Self {
            port,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn request_count(&self) -> usize {
        *self.state.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs fixture SQL directly against the backing database.
    pub fn exec(&self, sql: &str) -> TestResult<()> {
        let conn = self.state.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn query_string(&self, sql: &str) -> TestResult<Option<String>> {
        let conn = self.state.conn.lock().unwrap_or_else(|e| e.into_inner());
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }

    pub fn query_i64(&self, sql: &str) -> TestResult<i64> {
        let conn = self.state.conn.lock().unwrap_or_else(|e| e.into_inner());
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

pub fn find_free_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

struct LocalTempDir {
    path: PathBuf,
}

impl LocalTempDir {
    fn new(prefix: &str) -> TestResult<Self> {
        let path = std::env::temp_dir().join(format!("{}-{}", prefix, Uuid::new_v4().simple()));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LocalTempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
