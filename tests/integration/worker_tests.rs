//! End-to-end runs of the worker loop

use frontier_worker::backend::{Backend, BackendError, BackendResult, MemoryBackend};
use frontier_worker::bus::memory::{MemorySink, MemorySource, SourceEvent};
use frontier_worker::bus::PartitionKeyer;
use frontier_worker::config::{parse_config, WorkerConfig};
use frontier_worker::message::JsonCodec;
use frontier_worker::message::{ErrorInfo, Link, Request, Response};
use frontier_worker::worker::{ExclusionPolicy, FrontierWorker};
use frontier_worker::WorkerError;
use tokio_util::sync::CancellationToken;

/// Creates a worker configuration with a short poll timeout
fn test_worker_config(extra: &str) -> WorkerConfig {
    let toml = format!(
        r#"
[kafka]
location = "localhost:9092"
frontier-group = "frontier"
incoming-topic = "frontier-done"
outgoing-topic = "frontier-todo"

[worker]
max-next-requests = 100
poll-timeout-ms = 20
{}
"#,
        extra
    );
    parse_config(&toml).expect("test config is valid").worker
}

fn seeds_payload(urls: &[&str]) -> String {
    let seeds: Vec<String> = urls
        .iter()
        .map(|u| format!(r#"{{"url":"{}"}}"#, u))
        .collect();
    format!(r#"{{"type":"add_seeds","seeds":[{}]}}"#, seeds.join(","))
}

fn published_urls(sink: &MemorySink) -> Vec<String> {
    sink.published()
        .iter()
        .map(|m| JsonCodec.decode_request(&m.payload).unwrap().url)
        .collect()
}

#[tokio::test]
async fn test_seeds_are_published_by_domain() {
    let token = CancellationToken::new();
    let source = MemorySource::from_payloads([seeds_payload(&[
        "https://a.example/1",
        "https://b.example/1",
        "https://a.example/2",
    ])])
    .with_shutdown_when_idle(token.clone());

    let mut worker = FrontierWorker::new(
        &test_worker_config(""),
        MemoryBackend::new(),
        source,
        MemorySink::new(6),
    );
    worker.run(token).await.unwrap();

    let keyer = PartitionKeyer::new(6);
    let published = worker.sink().published();
    assert_eq!(published.len(), 3);
    for message in &published {
        let request = JsonCodec.decode_request(&message.payload).unwrap();
        let domain = frontier_worker::parse_domain(&request.url).unwrap();
        assert_eq!(message.key, domain.as_bytes());
        assert_eq!(message.partition, keyer.partition_for_domain(&domain));
    }
    assert_eq!(published[0].partition, published[2].partition);

    let stats = worker.stats();
    assert_eq!(stats.seeds_added, 3);
    assert_eq!(stats.requests_pushed, 3);
    assert_eq!(worker.backend().queued_len(), 0);
}

#[tokio::test]
async fn test_malformed_messages_are_skipped() {
    let token = CancellationToken::new();
    let source = MemorySource::from_payloads([
        "not json".to_string(),
        String::new(),
        r#"{"type":"unknown","x":1}"#.to_string(),
        seeds_payload(&["https://a.example/"]),
        r#"{"type":"request_error","error":"missing request"}"#.to_string(),
    ])
    .with_shutdown_when_idle(token.clone());

    let mut worker = FrontierWorker::new(
        &test_worker_config("disable-new-batches = true"),
        MemoryBackend::new(),
        source,
        MemorySink::new(1),
    );
    worker.run(token).await.unwrap();

    let stats = worker.stats();
    assert_eq!(stats.messages_consumed, 5);
    assert_eq!(stats.decode_errors, 4);
    assert_eq!(stats.seeds_added, 1);
    assert_eq!(worker.backend().queued_len(), 1);
}

#[tokio::test]
async fn test_offset_fault_moves_to_tail() {
    let token = CancellationToken::new();
    let mut source = MemorySource::new().with_shutdown_when_idle(token.clone());
    source.push(seeds_payload(&["https://before.example/"]));
    source.push_event(SourceEvent::OffsetFault);
    source.push(seeds_payload(&["https://lost.example/"]));
    source.push_event(SourceEvent::Tail);
    source.push(seeds_payload(&["https://after.example/"]));

    let mut worker = FrontierWorker::new(
        &test_worker_config("disable-new-batches = true"),
        MemoryBackend::new(),
        source,
        MemorySink::new(1),
    );
    worker.run(token).await.unwrap();

    assert_eq!(worker.stats().offset_resets, 1);
    assert_eq!(worker.source().resets(), 1);
    assert_eq!(worker.stats().seeds_added, 2);

    let backend = worker.backend();
    assert_eq!(backend.queued_len(), 2);
    let lost = Request::new("https://lost.example/").fingerprint();
    assert!(backend.state_of(&lost).is_none());
}

#[tokio::test]
async fn test_disabled_batches_never_publish() {
    let token = CancellationToken::new();
    let source = MemorySource::from_payloads([
        seeds_payload(&["https://a.example/", "https://b.example/"]),
        seeds_payload(&["https://c.example/"]),
    ])
    .with_shutdown_when_idle(token.clone());

    let mut worker = FrontierWorker::new(
        &test_worker_config("disable-new-batches = true"),
        MemoryBackend::new(),
        source,
        MemorySink::new(2),
    );
    worker.run(token).await.unwrap();

    assert!(worker.sink().published().is_empty());
    assert_eq!(worker.stats().batches_produced, 0);
    assert_eq!(worker.backend().queued_len(), 3);
}

#[tokio::test]
async fn test_excluded_links_never_reach_the_frontier() {
    let token = CancellationToken::new();
    let crawled = r#"{
        "type": "page_crawled",
        "r": {"url": "https://a.example/", "status_code": 200},
        "links": [
            {"url": "https://x.example/1"},
            {"url": "https://blocked.example/2"},
            {"url": "https://www.blocked.example/3"}
        ]
    }"#;
    let source = MemorySource::from_payloads([crawled]).with_shutdown_when_idle(token.clone());

    let mut worker = FrontierWorker::new(
        &test_worker_config(""),
        MemoryBackend::new(),
        source,
        MemorySink::new(3),
    )
    .with_link_filter(ExclusionPolicy::new(
        vec!["*.blocked.example".to_string()],
        vec![],
    ));
    worker.run(token).await.unwrap();

    assert_eq!(published_urls(worker.sink()), vec!["https://x.example/1"]);
    assert_eq!(worker.stats().links_filtered, 2);
    assert_eq!(worker.stats().pages_crawled, 1);
}

#[tokio::test]
async fn test_startup_batch_drains_existing_frontier() {
    let mut backend = MemoryBackend::new();
    backend
        .add_seeds(vec![
            Request::new("https://a.example/"),
            Request::new("https://b.example/"),
        ])
        .unwrap();

    let token = CancellationToken::new();
    let source = MemorySource::new().with_shutdown_when_idle(token.clone());
    let mut worker = FrontierWorker::new(&test_worker_config(""), backend, source, MemorySink::new(2));
    worker.run(token).await.unwrap();

    assert_eq!(
        published_urls(worker.sink()),
        vec!["https://a.example/", "https://b.example/"]
    );
    assert_eq!(worker.stats().batches_produced, 1);
    assert_eq!(worker.scheduler_state().produced, 2);
}

/// Backend that fails every call with the error produced by `make_error`
struct FailingBackend {
    make_error: fn() -> BackendError,
    calls: usize,
}

impl FailingBackend {
    fn fail(&mut self) -> BackendResult<()> {
        self.calls += 1;
        Err((self.make_error)())
    }
}

impl Backend for FailingBackend {
    fn add_seeds(&mut self, _seeds: Vec<Request>) -> BackendResult<()> {
        self.fail()
    }

    fn page_crawled(&mut self, _response: Response, _links: Vec<Link>) -> BackendResult<()> {
        self.fail()
    }

    fn request_error(&mut self, _request: Request, _error: ErrorInfo) -> BackendResult<()> {
        self.fail()
    }

    fn get_next_requests(&mut self, _max_count: usize) -> BackendResult<Vec<Request>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_recoverable_backend_errors_do_not_stop_the_worker() {
    let token = CancellationToken::new();
    let source = MemorySource::from_payloads([
        seeds_payload(&["https://a.example/"]),
        seeds_payload(&["https://b.example/"]),
    ])
    .with_shutdown_when_idle(token.clone());

    let backend = FailingBackend {
        make_error: || BackendError::Rejected("duplicate".to_string()),
        calls: 0,
    };
    let mut worker = FrontierWorker::new(
        &test_worker_config("disable-new-batches = true"),
        backend,
        source,
        MemorySink::new(1),
    );
    worker.run(token).await.unwrap();

    assert_eq!(worker.backend().calls, 2);
    assert_eq!(worker.stats().backend_errors, 2);
    assert_eq!(worker.stats().messages_consumed, 2);
}

#[tokio::test]
async fn test_unrecoverable_backend_error_stops_the_worker() {
    let token = CancellationToken::new();
    let source = MemorySource::from_payloads([
        seeds_payload(&["https://a.example/"]),
        seeds_payload(&["https://b.example/"]),
    ])
    .with_shutdown_when_idle(token.clone());

    let backend = FailingBackend {
        make_error: || BackendError::Unrecoverable("disk full".to_string()),
        calls: 0,
    };
    let mut worker = FrontierWorker::new(
        &test_worker_config("disable-new-batches = true"),
        backend,
        source,
        MemorySink::new(1),
    );
    let result = worker.run(token).await;

    assert!(matches!(
        result,
        Err(WorkerError::Backend(BackendError::Unrecoverable(_)))
    ));
    assert_eq!(worker.backend().calls, 1);
    assert_eq!(worker.source().remaining(), 1);
}
