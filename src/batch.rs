use crate::{
    Result,
    config::BatchConfig,
    driver::SessionLauncher,
    error::FailureKind,
    extractor::{ExtractionOutcome, Extractor},
    output::{OutputFormatter, text},
    transcript::TranscriptSegment,
    utils::signal::ShutdownSignal,
    video::VideoId,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::time::Duration;

/// Anything that can produce an outcome for one video. One call is one
/// extraction attempt.
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn extract(&self, video: &VideoId) -> ExtractionOutcome;
}

#[async_trait::async_trait]
impl<L: SessionLauncher> TranscriptSource for Extractor<L> {
    async fn extract(&self, video: &VideoId) -> ExtractionOutcome {
        self.try_extract(video).await.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub max_retries: u32,
    pub inter_request_delay: Duration,
    pub retry_backoff: Duration,
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            concurrency: config.concurrency.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoResult {
    pub success: bool,
    #[serde(serialize_with = "serialize_pairs")]
    pub transcript: Option<Vec<TranscriptSegment>>,
    pub error: Option<String>,
    pub error_kind: Option<FailureKind>,
    pub attempts: u32,
}

impl VideoResult {
    pub fn from_outcome(outcome: ExtractionOutcome, attempts: u32) -> Self {
        match outcome {
            ExtractionOutcome::Success(segments) => Self {
                success: true,
                transcript: Some(segments),
                error: None,
                error_kind: None,
                attempts,
            },
            ExtractionOutcome::Failure(failure) => Self {
                success: false,
                transcript: None,
                error: Some(failure.message),
                error_kind: Some(failure.kind),
                attempts,
            },
        }
    }
}

/// Transcripts are stored as `[timestamp, text]` pairs in result files.
fn serialize_pairs<S: Serializer>(
    transcript: &Option<Vec<TranscriptSegment>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match transcript {
        None => serializer.serialize_none(),
        Some(segments) => {
            let mut seq = serializer.serialize_seq(Some(segments.len()))?;
            for segment in segments {
                seq.serialize_element(&segment.as_pair())?;
            }
            seq.end()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub video_id: VideoId,
    pub result: VideoResult,
}

/// Final outcome per requested video, in request order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub interrupted: bool,
}

impl BatchResult {
    pub fn get(&self, video_id: &str) -> Option<&VideoResult> {
        self.entries
            .iter()
            .find(|entry| entry.video_id.as_str() == video_id)
            .map(|entry| &entry.result)
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&VideoId, &[TranscriptSegment])> {
        self.entries.iter().filter_map(|entry| {
            entry
                .result
                .transcript
                .as_deref()
                .map(|segments| (&entry.video_id, segments))
        })
    }

    pub fn summary(&self) -> BatchSummary {
        let total = self.total();
        let succeeded = self.succeeded();
        let success_rate = if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64 * 100.0
        };

        let failures = self
            .entries
            .iter()
            .filter(|e| !e.result.success)
            .map(|e| FailedVideo {
                video_id: e.video_id.to_string(),
                kind: e.result.error_kind.unwrap_or(FailureKind::BrowserError),
                error: e.result.error.clone().unwrap_or_default(),
                attempts: e.result.attempts,
            })
            .collect();

        BatchSummary {
            total,
            succeeded,
            failed: total - succeeded,
            success_rate,
            failures,
            interrupted: self.interrupted,
            duration_ms: (self.finished_at - self.started_at).num_milliseconds().max(0) as u64,
        }
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.video_id.as_str(), &entry.result)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedVideo {
    pub video_id: String,
    pub kind: FailureKind,
    pub error: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub failures: Vec<FailedVideo>,
    pub interrupted: bool,
    pub duration_ms: u64,
}

impl OutputFormatter for BatchSummary {
    fn format_text(&self) -> String {
        let mut output = text::section("Batch Summary");
        output.push('\n');
        output.push_str(&text::key_value("Total videos", &self.total.to_string()));
        output.push('\n');
        output.push_str(&text::key_value("Successful", &self.succeeded.to_string()));
        output.push('\n');
        output.push_str(&text::key_value("Failed", &self.failed.to_string()));
        output.push('\n');
        output.push_str(&text::key_value(
            "Success rate",
            &format!("{:.1}%", self.success_rate),
        ));
        output.push('\n');
        output.push_str(&text::key_value(
            "Duration",
            &text::format_duration_ms(self.duration_ms),
        ));

        if !self.failures.is_empty() {
            output.push_str(&text::subsection("Failed videos"));
            for failure in &self.failures {
                output.push('\n');
                output.push_str(&text::bullet(&format!(
                    "{}: {} ({} attempts)",
                    failure.video_id, failure.error, failure.attempts
                )));
            }
        }

        if self.interrupted {
            output.push('\n');
            output.push_str(&text::warning("Interrupted; remaining videos were skipped"));
        }

        output
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        crate::output::to_json(self, pretty)
    }
}

type ProgressFn = dyn Fn(&BatchEntry, usize, usize) + Send + Sync;

/// Applies a [`TranscriptSource`] to many videos with retries and pacing.
pub struct BatchRunner<S: TranscriptSource> {
    source: S,
    options: BatchOptions,
    shutdown: ShutdownSignal,
    progress: Option<Box<ProgressFn>>,
}

impl<S: TranscriptSource> BatchRunner<S> {
    pub fn new(source: S, options: BatchOptions) -> Self {
        Self {
            source,
            options,
            shutdown: ShutdownSignal::new(),
            progress: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Called once per finished video with its zero-based position and the
    /// number of distinct videos in the run.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&BatchEntry, usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn run(&self, videos: &[VideoId]) -> BatchResult {
        let started_at = Utc::now();
        let queue = dedup(videos);
        let total = queue.len();
        let concurrency = self.options.concurrency.max(1);

        tracing::info!(
            "Processing {} videos (concurrency {}, max retries {})",
            total,
            concurrency,
            self.options.max_retries
        );

        let stream = futures::stream::iter(
            queue
                .into_iter()
                .enumerate()
                .map(|(index, video)| self.process_video(index, total, video)),
        )
        .buffered(concurrency);
        let mut stream = std::pin::pin!(stream);

        let mut entries = Vec::with_capacity(total);
        while let Some(entry) = stream.next().await {
            if let Some(entry) = entry {
                entries.push(entry);
            }
        }

        let interrupted = self.shutdown.is_triggered();
        if interrupted {
            tracing::warn!(
                "Batch interrupted after {} of {} videos",
                entries.len(),
                total
            );
        }

        BatchResult {
            entries,
            started_at,
            finished_at: Utc::now(),
            interrupted,
        }
    }

    /// Returns `None` when the run was interrupted before this video
    /// reached a final outcome.
    async fn process_video(&self, index: usize, total: usize, video: VideoId) -> Option<BatchEntry> {
        let max_retries = self.options.max_retries.max(1);
        let mut attempt = 0;

        let result = loop {
            if self.shutdown.is_triggered() {
                return None;
            }
            attempt += 1;
            tracing::info!(
                "[{}/{}] {} attempt {}/{}",
                index + 1,
                total,
                video,
                attempt,
                max_retries
            );

            let outcome = self.source.extract(&video).await;
            if outcome.is_success() {
                break VideoResult::from_outcome(outcome, attempt);
            }
            // A failure produced while shutting down says nothing about the video.
            if self.shutdown.is_triggered() {
                return None;
            }
            if attempt >= max_retries {
                break VideoResult::from_outcome(outcome, attempt);
            }

            if let Some(failure) = outcome.failure() {
                tracing::warn!("Attempt {} for {} failed: {}", attempt, video, failure);
            }
            if !self.shutdown.sleep(self.options.retry_backoff).await {
                return None;
            }
        };

        let entry = BatchEntry {
            video_id: video,
            result,
        };
        if let Some(ref progress) = self.progress {
            progress(&entry, index, total);
        }

        if index + 1 < total {
            self.shutdown.sleep(self.options.inter_request_delay).await;
        }

        Some(entry)
    }
}

/// Keeps the first occurrence of every id, in request order.
pub fn dedup(videos: &[VideoId]) -> Vec<VideoId> {
    let mut seen = HashSet::new();
    videos
        .iter()
        .filter(|video| seen.insert(video.as_str()))
        .cloned()
        .collect()
}
