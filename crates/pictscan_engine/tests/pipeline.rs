use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use pictscan_core::{partition, FailureReason, ScanLedger};
use pictscan_engine::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher, OutputFiles, PageParser,
    ParseError, ParsedPage, RunOutcome, ScanConfig, ScanError, Scanner, ScraperParser, Worker,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MATCHING: &str =
    r#"<html><body><picture><source srcset="a.webp"><img src="a.jpg" sizes="50vw"></picture></body></html>"#;
const PLAIN: &str = r#"<html><body><img src="a.jpg"></body></html>"#;

fn init_logging() {
    pictscan_logging::initialize_for_tests();
}

fn config(dir: &TempDir, group_count: usize) -> ScanConfig {
    ScanConfig {
        group_count,
        output: OutputFiles::in_dir(dir.path().to_path_buf()),
        ..ScanConfig::default()
    }
}

fn page(url: &str, body: &str) -> FetchOutput {
    FetchOutput {
        bytes: body.as_bytes().to_vec(),
        metadata: FetchMetadata {
            original_url: url.to_string(),
            final_url: url.to_string(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            byte_len: body.len() as u64,
        },
    }
}

enum Canned {
    Body(&'static str),
    Fail(u16),
    Hang,
}

/// Serves canned pages; `Hang` reports the url on `hung` and never returns.
struct CannedFetcher {
    pages: HashMap<String, Canned>,
    hung: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        match self.pages.get(url) {
            Some(Canned::Body(body)) => Ok(page(url, body)),
            Some(Canned::Fail(code)) => Err(FetchError {
                kind: FailureKind::HttpStatus(*code),
                message: format!("Response code {code}"),
            }),
            Some(Canned::Hang) => {
                let _ = self.hung.send(url.to_string());
                std::future::pending().await
            }
            None => Err(FetchError {
                kind: FailureKind::Network,
                message: "unknown host".to_string(),
            }),
        }
    }
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn scan_over_http_partitions_every_url_into_one_outcome() {
    init_logging();
    let server = MockServer::start().await;
    for (route, body) in [("/match", MATCHING), ("/plain", PLAIN)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<p>caf\xe9</p><picture><source srcset=\"g.webp\"><img src=\"g.jpg\" sizes=\"40vw\"></picture>".to_vec(),
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let base = server.uri();
    let raw = vec![
        format!("{base}/match"),
        format!("{base}/plain"),
        format!("{base}/broken"),
        format!("{base}/match"),
        format!("{base}/garbled"),
    ];

    let dir = TempDir::new().unwrap();
    let scanner = Scanner::with_defaults(config(&dir, 3)).unwrap();
    let outcome = scanner
        .run(raw, std::future::pending::<()>())
        .await
        .unwrap();

    let RunOutcome::Completed { report, flush } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(report.workers.len(), 3);
    assert_eq!(report.processed(), 4);

    // A stray byte is decoded lossily; the page still classifies.
    let mut found: Vec<String> = serde_json::from_value(read_json(&flush.found_path)).unwrap();
    found.sort();
    assert_eq!(
        found,
        vec![format!("{base}/garbled"), format!("{base}/match")]
    );

    let errors: Vec<(String, String)> =
        serde_json::from_value(read_json(&flush.errors_path)).unwrap();
    assert_eq!(
        errors,
        vec![(
            format!("{base}/broken"),
            "Fetch failed: Response code 500 (Internal Server Error)".to_string()
        )]
    );
}

#[tokio::test]
async fn interrupt_cancels_exactly_the_pending_urls() {
    init_logging();
    let (hung_tx, mut hung_rx) = mpsc::unbounded_channel();
    let pages = HashMap::from([
        ("https://a".to_string(), Canned::Body(MATCHING)),
        ("https://b".to_string(), Canned::Hang),
        ("https://c".to_string(), Canned::Body(MATCHING)),
        ("https://d".to_string(), Canned::Fail(503)),
        ("https://e".to_string(), Canned::Hang),
        ("https://f".to_string(), Canned::Body(PLAIN)),
    ]);
    let fetcher = CannedFetcher {
        pages,
        hung: hung_tx,
    };
    let urls: Vec<String> = ["a", "b", "c", "d", "e", "f"]
        .iter()
        .map(|s| format!("https://{s}"))
        .collect();

    let dir = TempDir::new().unwrap();
    let scanner = Scanner::new(
        config(&dir, 2),
        Arc::new(fetcher),
        Arc::new(ScraperParser),
    )
    .unwrap();

    // Fire once both workers are stuck on their hanging fetch.
    let interrupt = async move {
        hung_rx.recv().await;
        hung_rx.recv().await;
    };
    let outcome = scanner.run(urls, interrupt).await.unwrap();

    assert!(outcome.is_interrupted());
    let RunOutcome::Interrupted { cancelled, flush } = outcome else {
        panic!("expected interruption");
    };
    assert_eq!(cancelled, 4);
    assert_eq!(flush.found_count, 1);
    assert_eq!(flush.error_count, 5);

    assert_eq!(read_json(&flush.found_path), serde_json::json!(["https://a"]));
    assert_eq!(
        read_json(&flush.errors_path),
        serde_json::json!([
            ["https://d", "Fetch failed: Response code 503"],
            ["https://b", "Cancelled before complete"],
            ["https://c", "Cancelled before complete"],
            ["https://e", "Cancelled before complete"],
            ["https://f", "Cancelled before complete"],
        ])
    );
}

#[tokio::test]
async fn every_input_url_lands_in_exactly_one_category() {
    init_logging();
    let (hung_tx, _hung_rx) = mpsc::unbounded_channel();
    let mut pages = HashMap::new();
    let mut raw = Vec::new();
    for i in 0..37 {
        let url = format!("https://site{i}.example");
        let canned = match i % 3 {
            0 => Canned::Body(MATCHING),
            1 => Canned::Body(PLAIN),
            _ => Canned::Fail(404),
        };
        pages.insert(url.clone(), canned);
        raw.push(url.clone());
        if i % 5 == 0 {
            raw.push(url);
        }
    }
    // Unknown to the fetcher: network failure.
    raw.push("https://unknown.example".to_string());

    let dir = TempDir::new().unwrap();
    let scanner = Scanner::new(
        config(&dir, 10),
        Arc::new(CannedFetcher {
            pages,
            hung: hung_tx,
        }),
        Arc::new(ScraperParser),
    )
    .unwrap();
    let outcome = scanner
        .run(raw.clone(), std::future::pending::<()>())
        .await
        .unwrap();
    let flush = outcome.flush();

    let found: Vec<String> = serde_json::from_value(read_json(&flush.found_path)).unwrap();
    let errors: Vec<(String, String)> =
        serde_json::from_value(read_json(&flush.errors_path)).unwrap();

    let unique: HashSet<String> = raw.into_iter().collect();
    let mut seen = HashSet::new();
    for url in found.iter().chain(errors.iter().map(|(url, _)| url)) {
        assert!(seen.insert(url.clone()), "{url} reported twice");
    }
    let not_matched = (0..37).filter(|i| i % 3 == 1).count();
    assert_eq!(found.len(), (0..37).filter(|i| i % 3 == 0).count());
    assert_eq!(seen.len() + not_matched, unique.len());
    assert!(seen.is_subset(&unique));
    assert!(errors
        .iter()
        .any(|(url, reason)| url == "https://unknown.example"
            && reason == &format!("{}", FailureReason::Fetch("unknown host".into()))));
}

#[tokio::test]
async fn empty_input_completes_with_empty_outputs() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let scanner = Scanner::with_defaults(config(&dir, 10)).unwrap();
    let outcome = scanner
        .run(Vec::<String>::new(), std::future::pending::<()>())
        .await
        .unwrap();

    assert!(!outcome.is_interrupted());
    let RunOutcome::Completed { report, flush } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(report.workers.len(), 10);
    assert_eq!(report.processed(), 0);
    assert_eq!(fs::read_to_string(&flush.found_path).unwrap(), "[]");
    assert_eq!(fs::read_to_string(&flush.errors_path).unwrap(), "[]");
}

#[test]
fn zero_groups_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = Scanner::with_defaults(config(&dir, 0)).err().unwrap();
    assert!(matches!(err, ScanError::Config(_)));
}

#[tokio::test]
async fn worker_records_in_group_order_and_stops_when_cancelled() {
    init_logging();
    let (hung_tx, _hung_rx) = mpsc::unbounded_channel();
    let fetcher: Arc<dyn Fetcher> = Arc::new(CannedFetcher {
        pages: HashMap::from([
            ("https://x".to_string(), Canned::Fail(404)),
            ("https://y".to_string(), Canned::Body(MATCHING)),
        ]),
        hung: hung_tx,
    });
    let urls = vec!["https://x".to_string(), "https://y".to_string()];

    let ledger = Arc::new(ScanLedger::new(&urls));
    let group = partition(&urls, 1).remove(0);
    let report = Worker::new(
        group.clone(),
        Arc::clone(&fetcher),
        Arc::new(ScraperParser),
        Arc::clone(&ledger),
        CancellationToken::new(),
    )
    .run()
    .await;
    assert_eq!(report.processed, 2);
    assert_eq!(ledger.pending_count(), 0);
    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.found, vec!["https://y"]);
    assert_eq!(snapshot.errors[0].url, "https://x");

    let fresh = Arc::new(ScanLedger::new(&urls));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = Worker::new(
        group,
        fetcher,
        Arc::new(ScraperParser),
        Arc::clone(&fresh),
        cancel,
    )
    .run()
    .await;
    assert_eq!(report.processed, 0);
    assert_eq!(report.assigned, 2);
    assert_eq!(fresh.pending_count(), 2);
}

/// Panics on urls containing "boom", otherwise defers to `ScraperParser`.
struct ExplodingParser;

impl PageParser for ExplodingParser {
    fn parse(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        base_url: &str,
    ) -> Result<ParsedPage, ParseError> {
        if base_url.contains("boom") {
            panic!("parser blew up on {base_url}");
        }
        ScraperParser.parse(body, content_type, base_url)
    }
}

#[tokio::test]
async fn panicking_url_leaves_the_working_set() {
    init_logging();
    let (hung_tx, _hung_rx) = mpsc::unbounded_channel();
    let fetcher: Arc<dyn Fetcher> = Arc::new(CannedFetcher {
        pages: HashMap::from([
            ("https://ok".to_string(), Canned::Body(MATCHING)),
            ("https://boom".to_string(), Canned::Body(PLAIN)),
            ("https://after".to_string(), Canned::Body(PLAIN)),
        ]),
        hung: hung_tx,
    });
    let urls: Vec<String> = ["https://ok", "https://boom", "https://after"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let ledger = Arc::new(ScanLedger::new(&urls));
    let group = partition(&urls, 1).remove(0);
    let worker = Worker::new(
        group,
        fetcher,
        Arc::new(ExplodingParser),
        Arc::clone(&ledger),
        CancellationToken::new(),
    );
    let joined = tokio::spawn(worker.run()).await;

    assert!(joined.unwrap_err().is_panic());
    assert!(!ledger.is_pending("https://boom"));
    assert!(ledger.is_pending("https://after"));
    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.found, vec!["https://ok"]);
    assert!(snapshot.errors.is_empty());
}

#[tokio::test]
async fn worker_panic_fails_the_run_after_flushing() {
    init_logging();
    let (hung_tx, _hung_rx) = mpsc::unbounded_channel();
    let fetcher = CannedFetcher {
        pages: HashMap::from([
            ("https://ok".to_string(), Canned::Body(MATCHING)),
            ("https://boom".to_string(), Canned::Body(PLAIN)),
        ]),
        hung: hung_tx,
    };
    let dir = TempDir::new().unwrap();
    let scanner = Scanner::new(
        config(&dir, 2),
        Arc::new(fetcher),
        Arc::new(ExplodingParser),
    )
    .unwrap();

    let err = scanner
        .run(["https://ok", "https://boom"], std::future::pending::<()>())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::WorkerPanicked { index: 1, .. }));

    let files = OutputFiles::in_dir(dir.path().to_path_buf());
    assert_eq!(read_json(&files.found_path()), serde_json::json!(["https://ok"]));
    assert_eq!(read_json(&files.errors_path()), serde_json::json!([]));
}
