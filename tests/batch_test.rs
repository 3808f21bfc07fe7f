use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use transcript_grabber::{
    BatchOptions, BatchRunner, FailureKind, TranscriptSegment, TranscriptSource, VideoId,
    extractor::{ExtractionFailure, ExtractionOutcome},
    utils::signal::ShutdownSignal,
};

/// Replays a fixed sequence of outcomes per video; the last one repeats.
#[derive(Default)]
struct StubSource {
    outcomes: HashMap<String, Vec<ExtractionOutcome>>,
    calls: Mutex<Vec<(String, Instant)>>,
    latency: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubSource {
    fn with(mut self, id: &str, outcomes: Vec<ExtractionOutcome>) -> Self {
        self.outcomes.insert(id.to_string(), outcomes);
        self
    }

    fn with_latency(mut self, id: &str, latency: Duration) -> Self {
        self.latency.insert(id.to_string(), latency);
        self
    }

    fn attempts(&self, id: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(v, _)| v == id)
            .map(|(_, at)| *at)
            .collect()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TranscriptSource for StubSource {
    async fn extract(&self, video: &VideoId) -> ExtractionOutcome {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((video.to_string(), Instant::now()));
            calls.iter().filter(|(v, _)| v == video.as_str()).count()
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency.get(video.as_str()) {
            tokio::time::sleep(*latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let script = self
            .outcomes
            .get(video.as_str())
            .cloned()
            .unwrap_or_else(|| vec![ok(&[("0:00", "default")])]);
        let index = (attempt - 1).min(script.len() - 1);
        script[index].clone()
    }
}

fn ok(pairs: &[(&str, &str)]) -> ExtractionOutcome {
    ExtractionOutcome::Success(
        pairs
            .iter()
            .map(|(ts, text)| TranscriptSegment::new(*ts, *text))
            .collect(),
    )
}

fn fail(kind: FailureKind, message: &str) -> ExtractionOutcome {
    ExtractionOutcome::Failure(ExtractionFailure {
        kind,
        message: message.to_string(),
    })
}

fn ids(ids: &[&str]) -> Vec<VideoId> {
    ids.iter().map(|id| VideoId::parse(id).unwrap()).collect()
}

fn options(max_retries: u32, delay_ms: u64, backoff_ms: u64, concurrency: usize) -> BatchOptions {
    BatchOptions {
        max_retries,
        inter_request_delay: Duration::from_millis(delay_ms),
        retry_backoff: Duration::from_millis(backoff_ms),
        concurrency,
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_and_exhausted_retries() {
    let source = StubSource::default()
        .with("A", vec![ok(&[("0:00", "hi")])])
        .with(
            "B",
            vec![fail(
                FailureKind::TranscriptNotFound,
                "No transcript available for video B",
            )],
        );
    let runner = BatchRunner::new(source, options(2, 2000, 5000, 1));

    let result = runner.run(&ids(&["A", "B"])).await;

    let a = result.get("A").unwrap();
    assert!(a.success);
    assert_eq!(a.attempts, 1);
    assert_eq!(
        a.transcript.as_deref(),
        Some(&[TranscriptSegment::new("0:00", "hi")][..])
    );

    let b = result.get("B").unwrap();
    assert!(!b.success);
    assert_eq!(b.attempts, 2);
    assert_eq!(b.error_kind, Some(FailureKind::TranscriptNotFound));
    assert_eq!(b.error.as_deref(), Some("No transcript available for video B"));

    let summary = result.summary();
    assert_eq!(
        (summary.total, summary.succeeded, summary.failed),
        (2, 1, 1)
    );
    assert_eq!(summary.failures[0].video_id, "B");
    assert!(!result.interrupted);
}

#[tokio::test(start_paused = true)]
async fn test_retry_until_success_with_backoff() {
    let source = StubSource::default().with(
        "flaky",
        vec![
            fail(FailureKind::BrowserError, "Browser automation failed: reset"),
            fail(FailureKind::VideoNotFound, "Video flaky not accessible"),
            ok(&[("0:00", "finally")]),
        ],
    );
    let runner = BatchRunner::new(source, options(3, 100, 500, 1));

    let result = runner.run(&ids(&["flaky"])).await;

    let entry = result.get("flaky").unwrap();
    assert!(entry.success);
    assert_eq!(entry.attempts, 3);

    let source_attempts = runner.source().attempts("flaky");
    assert_eq!(source_attempts.len(), 3);
    for pair in source_attempts.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(500));
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_failure_kind_is_retried() {
    let source = StubSource::default().with(
        "gone",
        vec![fail(FailureKind::VideoNotFound, "Video gone not accessible")],
    );
    let runner = BatchRunner::new(source, options(3, 0, 10, 1));

    let result = runner.run(&ids(&["gone"])).await;

    assert_eq!(result.get("gone").unwrap().attempts, 3);
    assert_eq!(runner.source().total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_inter_request_delay_except_after_last() {
    let source = StubSource::default();
    let runner = BatchRunner::new(source, options(1, 2000, 5000, 1));

    let started = Instant::now();
    let result = runner.run(&ids(&["one", "two", "three"])).await;

    assert_eq!(result.total(), 3);
    let source = runner.source();
    assert_eq!(source.attempts("two")[0] - source.attempts("one")[0], Duration::from_millis(2000));
    assert_eq!(source.attempts("three")[0] - source.attempts("two")[0], Duration::from_millis(2000));
    assert_eq!(started.elapsed(), Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_collapse_to_first_occurrence() {
    let source = StubSource::default();
    let runner = BatchRunner::new(source, options(1, 0, 1, 1));

    let result = runner.run(&ids(&["x", "y", "x"])).await;

    let order: Vec<&str> = result.entries.iter().map(|e| e.video_id.as_str()).collect();
    assert_eq!(order, vec!["x", "y"]);
    assert_eq!(runner.source().total_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_preserves_request_order() {
    let source = StubSource::default()
        .with_latency("slow", Duration::from_secs(10))
        .with_latency("mid", Duration::from_secs(5))
        .with_latency("fast", Duration::from_secs(1));
    let runner = BatchRunner::new(source, options(1, 0, 1, 3));

    let started = Instant::now();
    let result = runner.run(&ids(&["slow", "mid", "fast"])).await;

    let order: Vec<&str> = result.entries.iter().map(|e| e.video_id.as_str()).collect();
    assert_eq!(order, vec!["slow", "mid", "fast"]);
    assert_eq!(runner.source().max_in_flight.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() < Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn test_sequential_mode_has_one_in_flight() {
    let source = StubSource::default()
        .with_latency("a", Duration::from_secs(1))
        .with_latency("b", Duration::from_secs(1));
    let runner = BatchRunner::new(source, options(1, 0, 1, 1));

    runner.run(&ids(&["a", "b"])).await;

    assert_eq!(runner.source().max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_returns_partial_result() {
    let source = StubSource::default();
    let shutdown = ShutdownSignal::new();
    let runner = BatchRunner::new(source, options(1, 2000, 5000, 1)).with_shutdown(shutdown.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3000)).await;
        shutdown.trigger();
    });

    let result = runner.run(&ids(&["first", "second", "third"])).await;

    let order: Vec<&str> = result.entries.iter().map(|e| e.video_id.as_str()).collect();
    assert_eq!(order, vec!["first", "second"]);
    assert!(result.interrupted);
    assert!(result.summary().interrupted);
    assert_eq!(runner.source().total_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_backoff_drops_unfinished_video() {
    let source = StubSource::default().with(
        "failing",
        vec![fail(FailureKind::BrowserError, "Browser automation failed: x")],
    );
    let shutdown = ShutdownSignal::new();
    let runner = BatchRunner::new(source, options(3, 0, 10_000, 1)).with_shutdown(shutdown.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.trigger();
    });

    let started = Instant::now();
    let result = runner.run(&ids(&["failing", "never"])).await;

    assert!(result.entries.is_empty());
    assert!(result.interrupted);
    assert_eq!(runner.source().total_calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_progress_reports_each_video() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let runner = BatchRunner::new(StubSource::default(), options(1, 0, 1, 1)).with_progress(
        move |entry, index, total| {
            sink.lock()
                .unwrap()
                .push((entry.video_id.to_string(), index, total));
        },
    );

    runner.run(&ids(&["p", "q"])).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("p".to_string(), 0, 2), ("q".to_string(), 1, 2)]
    );
}

#[test]
fn test_results_json_shape() {
    let source = StubSource::default()
        .with("A", vec![ok(&[("0:00", "hi")])])
        .with("B", vec![fail(FailureKind::TranscriptNotFound, "No transcript")]);
    let runner = BatchRunner::new(source, options(2, 0, 1, 1));

    let result = tokio_test::block_on(runner.run(&ids(&["A", "B"])));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "A": {
                "success": true,
                "transcript": [["0:00", "hi"]],
                "error": null,
                "error_kind": null,
                "attempts": 1
            },
            "B": {
                "success": false,
                "transcript": null,
                "error": "No transcript",
                "error_kind": "transcript_not_found",
                "attempts": 2
            }
        })
    );
}
