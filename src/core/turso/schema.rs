//! Schema bootstrap: tables, indexes, triggers and seed rows, applied in one
//! pipeline round trip. Safe to re-run.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::client::{Statement, StepResult, TursoClient};
use super::error::TursoError;
use crate::core::credentials::Credentials;

pub const SCHEMA_SQL: &str = r#"
-- Mission control state layer.
-- Idempotent: IF NOT EXISTS / INSERT OR IGNORE throughout.

PRAGMA foreign_keys = ON;

-- ==================== Agents ====================

CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT 'SPC' CHECK (type IN ('LEAD', 'SPC', 'INT')),
    status TEXT NOT NULL DEFAULT 'idle' CHECK (status IN ('working', 'idle', 'waiting')),
    emoji TEXT,
    about TEXT,
    skills TEXT NOT NULL DEFAULT '[]',
    status_reason TEXT,
    since_ago TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ==================== Goals ====================

CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ==================== Tasks ====================

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    goal_id TEXT REFERENCES goals(id) ON DELETE SET NULL,
    assigned_agent_id TEXT REFERENCES agents(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    priority INTEGER NOT NULL DEFAULT 2,
    tags TEXT NOT NULL DEFAULT '[]',
    days_ago INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Added after the first release; older databases report a duplicate column on re-run.
ALTER TABLE tasks ADD COLUMN error_message TEXT;

CREATE INDEX IF NOT EXISTS idx_tasks_agent_status ON tasks(assigned_agent_id, status);
CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority, created_at);

-- ==================== Runs ====================

CREATE TABLE IF NOT EXISTS agent_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL REFERENCES agents(id),
    task_id TEXT REFERENCES tasks(id) ON DELETE SET NULL,
    tokens_used INTEGER NOT NULL DEFAULT 0,
    cost_usd REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL CHECK (status IN ('success', 'failed', 'retry')),
    summary TEXT,
    model TEXT,
    started_at TEXT NOT NULL DEFAULT (datetime('now')),
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_agent_runs_started ON agent_runs(started_at DESC);

-- ==================== Memory ====================

CREATE TABLE IF NOT EXISTS memory_summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL REFERENCES agents(id),
    summary TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_memory_agent ON memory_summaries(agent_id, created_at DESC);

-- ==================== Token usage ====================

CREATE TABLE IF NOT EXISTS token_usage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL REFERENCES agents(id),
    date TEXT NOT NULL,
    tokens_used INTEGER NOT NULL DEFAULT 0,
    cost_usd REAL NOT NULL DEFAULT 0,
    run_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE (agent_id, date)
);

-- ==================== Triggers ====================

CREATE TRIGGER IF NOT EXISTS tasks_touch_updated_at
AFTER UPDATE OF status ON tasks
WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE tasks SET updated_at = datetime('now') WHERE id = NEW.id;
END;

CREATE TRIGGER IF NOT EXISTS agent_runs_rollup_usage
AFTER INSERT ON agent_runs
BEGIN
    INSERT OR IGNORE INTO token_usage (agent_id, date, tokens_used, cost_usd, run_count)
    VALUES (NEW.agent_id, date(NEW.started_at), 0, 0, 0);
    UPDATE token_usage
       SET tokens_used = tokens_used + NEW.tokens_used,
           cost_usd = cost_usd + NEW.cost_usd,
           run_count = run_count + 1
     WHERE agent_id = NEW.agent_id AND date = date(NEW.started_at);
END;

/* ==================== Seed agents ==================== */

INSERT OR IGNORE INTO agents (id, name, role, type, status, emoji, about, skills, status_reason, since_ago) VALUES
    ('max', 'Max', 'Director of Strategy', 'LEAD', 'working', '🧠',
     'I am Max, Director of Strategy. I set direction, resolve ambiguity, and keep the team aligned. Every decision is a calculated bet on the best outcome.',
     '["leadership","strategy","vision","decision-making","prioritization"]',
     'Running weekly planning sync. Reviewing website conversion metrics and aligning team on Q1 targets.', '2h ago'),
    ('jordan', 'Jordan', 'Project Operations Lead', 'LEAD', 'working', '⚡',
     'I am Jordan, Ops Lead. I turn strategy into deliverables. I own the project board, unblock the team, and make sure nothing slips through the cracks.',
     '["project-management","execution","ops","unblocking","coordination"]',
     'Coordinating domain transfer to sellsig.com. Running deployment checklist with Taylor.', '45m ago'),
    ('sage', 'Sage', 'Brand & Messaging Specialist', 'SPC', 'working', '✍️',
     'I am Sage. Words are my craft. I build brand voice, write copy that converts, and make sure SellSig sounds like a category leader before it becomes one.',
     '["copywriting","brand-voice","messaging","headlines","cta"]',
     'Finalizing hero headline A/B variants. Awaiting Riley''s UX review before handoff.', '1h ago'),
    ('taylor', 'Taylor', 'DevOps & Deployment', 'INT', 'working', '🔧',
     'I am Taylor. I make sure the code ships, the site stays up, and the infra scales. Fast deploys and zero-downtime are my baseline.',
     '["deployment","ci-cd","dns","performance","monitoring"]',
     'Running build pipeline verification. Checking Core Web Vitals on staging.', '30m ago'),
    ('morgan', 'Morgan', 'Competitive Intelligence', 'SPC', 'working', '🔍',
     'I am Morgan. I track the competition so we can out-position them. I find the gaps in Gong, Chorus, and Clari that SellSig can own.',
     '["research","competitive-analysis","positioning","market-intel","pricing"]',
     'Building win/loss framework. Cross-referencing Gong G2 reviews for pain points.', '2h ago'),
    ('email-expert', 'Email Expert', 'Email Marketing Specialist', 'SPC', 'working', '📧',
     'I am the Email Expert. I build sequences that convert, nurture pipelines, and turn cold leads warm. Every email has a job to do.',
     '["email-copy","sequences","automation","segmentation","deliverability"]',
     'Setting up welcome sequence in email service. Waiting on sign-up form integration.', '3h ago'),
    ('seo', 'SEO Expert', 'SEO & Content Strategy', 'SPC', 'working', '📈',
     'I am the SEO Expert. I get SellSig to page one. Keyword targeting, technical SEO, and content architecture are my weapons.',
     '["seo","keywords","content-strategy","schema","link-building"]',
     'Implementing JSON-LD schema on product pages. Running Lighthouse audit.', '1h ago'),
    ('legal', 'Legal Counsel', 'Legal & Compliance', 'INT', 'idle', '⚖️',
     'I am Legal Counsel. I protect SellSig from liability and ensure compliance. GDPR, CCPA, FTC: I make sure we stay clean.',
     '["gdpr","ccpa","privacy","terms","compliance","ftc"]',
     'Legal docs delivered. Monitoring for regulatory changes. Available for review requests.', '4h ago'),
    ('cso', 'CSO', 'Chief Security Officer', 'INT', 'working', '🛡️',
     'I am the CSO. I secure SellSig''s infrastructure, data, and reputation. Breaches don''t happen on my watch.',
     '["security","soc2","vulnerability-assessment","hardening","pen-testing"]',
     'Running initial vulnerability assessment on the application stack.', '1h ago');
"#;

/// Error fragments that mean "already applied" rather than "broken".
const TOLERATED_ERRORS: &[&str] = &[
    "already exists",
    "duplicate column name",
    "no transaction is active",
];

/// Directives the HTTP protocol does not carry across requests.
const UNSUPPORTED_DIRECTIVES: &[&str] = &["PRAGMA"];

/// Quoted literals and comments are matched first so their contents are
/// skipped; the captured group is a block keyword; a bare `;` terminates.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)'(?:[^']|'')*'|"(?:[^"]|"")*"|--[^\n]*|/\*.*?\*/|\b(begin|case|end)\b|;"#)
        .expect("statement token regex is valid")
});

/// Removes leading whitespace, `--` line comments and `/* */` block comments.
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |i| &after[i + 1..]).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |i| &after[i + 2..]).trim_start();
        } else {
            return rest;
        }
    }
}

/// Splits a script into statements on `;`, except inside `BEGIN ... END`
/// (and `CASE ... END`) blocks. A `BEGIN` that opens a statement is a
/// transaction, not a block. Text after the last `;` is kept if non-blank.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for caps in TOKEN_RE.captures_iter(script) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if let Some(keyword) = caps.get(1) {
            match keyword.as_str().to_ascii_lowercase().as_str() {
                "begin" => {
                    let opens_statement =
                        strip_leading_comments(&script[start..whole.start()]).is_empty();
                    if !opens_statement {
                        depth += 1;
                    }
                }
                "case" => depth += 1,
                _ => depth = depth.saturating_sub(1),
            }
        } else if whole.as_str() == ";" && depth == 0 {
            let stmt = script[start..whole.start()].trim();
            if !stmt.is_empty() {
                statements.push(stmt.to_string());
            }
            start = whole.end();
        }
    }

    let tail = script[start..].trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    statements
}

/// Statements worth sending: comment-only fragments and unsupported
/// directives are dropped, leading comments are trimmed off.
pub fn executable_statements(script: &str) -> Vec<String> {
    split_statements(script)
        .iter()
        .map(|s| strip_leading_comments(s))
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let first = s
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .next()
                .unwrap_or_default();
            !UNSUPPORTED_DIRECTIVES
                .iter()
                .any(|d| first.eq_ignore_ascii_case(d))
        })
        .map(str::to_string)
        .collect()
}

pub fn is_tolerated_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TOLERATED_ERRORS.iter().any(|needle| lower.contains(needle))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub applied: usize,
    pub tolerated: usize,
}

impl SchemaReport {
    pub fn total(&self) -> usize {
        self.applied + self.tolerated
    }
}

/// Progress callback: `(step, total, sql)` with a 1-based step.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(usize, usize, &str) + Send);

pub async fn run_schema(
    client: &TursoClient,
    credentials: Option<&Credentials>,
    on_progress: Option<ProgressFn<'_>>,
) -> Result<SchemaReport, TursoError> {
    run_script(client, SCHEMA_SQL, credentials, on_progress).await
}

/// Sends every executable statement of `script` as one batch and inspects
/// each step. Tolerated errors count as applied; the first other error
/// aborts with its 1-based position.
pub async fn run_script(
    client: &TursoClient,
    script: &str,
    credentials: Option<&Credentials>,
    mut on_progress: Option<ProgressFn<'_>>,
) -> Result<SchemaReport, TursoError> {
    let statements: Vec<Statement> = executable_statements(script)
        .into_iter()
        .map(Statement::new)
        .collect();
    let total = statements.len();
    info!("Applying schema: {} statement(s)", total);

    let results = client.pipeline(&statements, credentials).await?;

    let mut report = SchemaReport::default();
    for (i, (result, statement)) in results.iter().zip(&statements).enumerate() {
        match result {
            StepResult::Error(message) if is_tolerated_error(message) => {
                debug!("Statement {} already applied: {}", i + 1, message);
                report.tolerated += 1;
            }
            StepResult::Error(message) => {
                return Err(TursoError::Statement {
                    index: i + 1,
                    message: message.clone(),
                });
            }
            StepResult::Ok(_) => report.applied += 1,
        }
        if let Some(progress) = on_progress.as_mut() {
            progress(i + 1, total, &statement.sql);
        }
    }

    info!(
        "Schema applied: {} new, {} already present",
        report.applied, report.tolerated
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_body_stays_in_one_statement() {
        let script = "CREATE TABLE t(x);\nCREATE TRIGGER tr AFTER INSERT ON t BEGIN UPDATE t SET x=1; UPDATE t SET x=2; END;\n";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE t(x)");
        assert!(statements[1].starts_with("CREATE TRIGGER tr"));
        assert!(statements[1].ends_with("UPDATE t SET x=2; END"));
    }

    #[test]
    fn keywords_match_whole_words_case_insensitively() {
        let script = "create table beginnings(ending text);\ncreate trigger t after insert on beginnings begin\n  update beginnings set ending = 'x';\nEnd;\nselect 1";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2], "select 1");
    }

    #[test]
    fn case_expression_inside_trigger_does_not_close_block() {
        let script = "CREATE TRIGGER t AFTER INSERT ON r BEGIN UPDATE x SET s = CASE NEW.s WHEN 'a' THEN 'b' END; UPDATE y SET z = 1; END; SELECT 2;";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("UPDATE y SET z = 1; END"));
    }

    #[test]
    fn quoted_text_and_comments_are_ignored_by_the_scanner() {
        let script = "INSERT INTO n VALUES ('semi; colon', 'BEGIN here');\n-- END; of comment\nINSERT INTO n VALUES ('it''s; fine');";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 2);
        assert!(statements[1].ends_with("VALUES ('it''s; fine')"));
    }

    #[test]
    fn transaction_begin_does_not_open_a_block() {
        let script = "BEGIN TRANSACTION;\nCREATE TABLE a(x);\nCOMMIT;";
        assert_eq!(
            split_statements(script),
            vec!["BEGIN TRANSACTION", "CREATE TABLE a(x)", "COMMIT"]
        );
    }

    #[test]
    fn trailing_text_without_terminator_is_kept() {
        assert_eq!(split_statements("SELECT 1;\n  SELECT 2  \n"), vec!["SELECT 1", "SELECT 2"]);
        assert!(split_statements("  ;; \n").is_empty());
    }

    #[test]
    fn pragmas_and_comment_only_fragments_are_filtered() {
        let script = "PRAGMA foreign_keys = ON;\n/* banner */;\n-- note\nCREATE TABLE a(x);\n  pragma journal_mode=WAL;";
        assert_eq!(executable_statements(script), vec!["CREATE TABLE a(x)"]);
    }

    #[test]
    fn bundled_schema_splits_into_expected_objects() {
        let statements = executable_statements(SCHEMA_SQL);
        assert!(statements.iter().all(|s| !s.starts_with("PRAGMA")));
        assert!(statements.iter().all(|s| !s.starts_with("--")));

        let triggers: Vec<&String> = statements
            .iter()
            .filter(|s| s.starts_with("CREATE TRIGGER"))
            .collect();
        assert_eq!(triggers.len(), 2);
        assert!(triggers.iter().all(|t| t.trim_end().ends_with("END")));

        let tables = statements
            .iter()
            .filter(|s| s.starts_with("CREATE TABLE"))
            .count();
        assert_eq!(tables, 6);
        assert!(statements.last().unwrap().starts_with("INSERT OR IGNORE INTO agents"));
    }

    #[test]
    fn splitting_is_repeatable() {
        assert_eq!(executable_statements(SCHEMA_SQL), executable_statements(SCHEMA_SQL));
    }

    #[test]
    fn tolerated_errors_match_idempotency_signatures() {
        assert!(is_tolerated_error("SQLite error: table agents already exists"));
        assert!(is_tolerated_error("duplicate column name: error_message"));
        assert!(is_tolerated_error("cannot commit - no transaction is active"));
        assert!(!is_tolerated_error("no such table: agentz"));
        assert!(!is_tolerated_error("near \"CREAT\": syntax error"));
    }
}
