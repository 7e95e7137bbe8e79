//! Worker runs against the SQLite backend

use frontier_worker::backend::{open_backend, SqliteBackend};
use frontier_worker::bus::memory::{MemorySink, MemorySource};
use frontier_worker::config::{parse_config, BackendKind};
use frontier_worker::state::RequestState;
use frontier_worker::worker::FrontierWorker;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_sqlite_frontier_survives_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("frontier.db");
    let toml = format!(
        r#"
[kafka]
location = "localhost:9092"
frontier-group = "frontier"
incoming-topic = "frontier-done"
outgoing-topic = "frontier-todo"

[worker]
max-next-requests = 1
poll-timeout-ms = 20

[backend]
kind = "sqlite"
database-path = "{}"
"#,
        db_path.display()
    );
    let config = parse_config(&toml).unwrap();
    assert_eq!(config.backend.kind, BackendKind::Sqlite);

    let token = CancellationToken::new();
    let source = MemorySource::from_payloads([
        r#"{"type":"add_seeds","seeds":[{"url":"https://a.example/"},{"url":"https://b.example/"}]}"#,
        r#"{"type":"request_error","r":{"url":"https://c.example/"},"error":"timeout"}"#,
    ])
    .with_shutdown_when_idle(token.clone());

    let backend = open_backend(&config.backend).unwrap();
    let mut worker = FrontierWorker::new(&config.worker, backend, source, MemorySink::new(2));
    worker.run(token).await.unwrap();

    // One batch of max-next-requests was handed out
    assert_eq!(worker.sink().published().len(), 1);
    drop(worker);

    let reopened = SqliteBackend::new(&db_path).unwrap();
    assert_eq!(reopened.count_in_state(RequestState::Scheduled).unwrap(), 1);
    assert_eq!(reopened.count_in_state(RequestState::Queued).unwrap(), 1);
    assert_eq!(reopened.count_in_state(RequestState::Failed).unwrap(), 1);
}
