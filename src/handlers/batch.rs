use crate::{
    GrabberError, Result,
    batch::{BatchEntry, BatchResult, BatchRunner, BatchSummary, TranscriptSource},
    config::Config,
    output::{self, OutputFormatter, text},
    persist::{self, SaveFailure},
    transcript::OutputFormat,
    video::{self, VideoId},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub saved_transcripts: Vec<PathBuf>,
    pub results_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub save_failures: Vec<SaveFailure>,
}

impl BatchReport {
    /// Error describing why the run should exit non-zero, if it should.
    pub fn exit_error(&self) -> Option<GrabberError> {
        if self.summary.interrupted {
            Some(GrabberError::Interrupted)
        } else if !self.save_failures.is_empty() {
            Some(GrabberError::SaveIncomplete {
                failed: self.save_failures.len(),
            })
        } else if self.summary.failed > 0 {
            Some(GrabberError::BatchIncomplete {
                failed: self.summary.failed,
                total: self.summary.total,
            })
        } else {
            None
        }
    }
}

impl OutputFormatter for BatchReport {
    fn format_text(&self) -> String {
        let mut output = self.summary.format_text();

        if !self.saved_transcripts.is_empty() {
            output.push('\n');
            output.push_str(&text::info(&format!(
                "Saved {} transcripts",
                self.saved_transcripts.len()
            )));
        }
        if let Some(ref path) = self.results_file {
            output.push('\n');
            output.push_str(&text::info(&format!("Results saved to: {}", path.display())));
        }
        for failure in &self.save_failures {
            output.push('\n');
            output.push_str(&text::error(&format!(
                "Could not write {}: {}",
                failure.path.display(),
                failure.error
            )));
        }

        output
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub videos: Vec<String>,
    pub file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Positional ids first, then the list file, in order.
pub fn collect_videos(args: &[String], file: Option<&Path>) -> Result<Vec<VideoId>> {
    let mut videos = args
        .iter()
        .map(|arg| VideoId::parse(arg))
        .collect::<Result<Vec<_>>>()?;

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)?;
        videos.extend(video::parse_list(&content)?);
    }

    if videos.is_empty() {
        return Err(GrabberError::InvalidVideoId(
            "no videos given; pass ids or --file".into(),
        ));
    }

    Ok(videos)
}

pub fn progress_line(entry: &BatchEntry, index: usize, total: usize) -> String {
    let position = format!("[{}/{}]", index + 1, total);
    let result = &entry.result;
    match result.transcript {
        Some(ref segments) => text::success(&format!(
            "{} {}: {} segments (attempt {})",
            position,
            entry.video_id,
            segments.len(),
            result.attempts
        )),
        None => text::error(&format!(
            "{} {}: {} (after {} attempts)",
            position,
            entry.video_id,
            result.error.as_deref().unwrap_or("unknown error"),
            result.attempts
        )),
    }
}

pub async fn handle_batch<S: TranscriptSource>(
    runner: &BatchRunner<S>,
    config: &Config,
    request: BatchRequest,
) -> Result<(BatchResult, BatchReport)> {
    let videos = collect_videos(&request.videos, request.file.as_deref())?;
    let result = runner.run(&videos).await;

    let mut save_failures = Vec::new();

    let results_file = match request.results {
        Some(path) => match persist::save_batch_results(&path, &result, config.output.json_pretty) {
            Ok(()) => Some(path),
            Err(e) => {
                save_failures.push(SaveFailure::new(path, e));
                None
            }
        },
        None => None,
    };

    let saved_transcripts = match request.output_dir {
        Some(ref dir) => {
            let save = persist::save_batch_transcripts(
                dir,
                &result,
                request.format,
                &super::extract::render_options(config),
            );
            save_failures.extend(save.failures);
            save.written
        }
        None => Vec::new(),
    };

    let report = BatchReport {
        summary: result.summary(),
        saved_transcripts,
        results_file,
        save_failures,
    };
    Ok((result, report))
}
