use crate::{
    Result,
    batch::BatchResult,
    output,
    transcript::{
        TranscriptSegment,
        format::{OutputFormat, RenderOptions, render},
    },
    video::VideoId,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file that could not be written during a batch save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveFailure {
    pub path: PathBuf,
    pub error: String,
}

impl SaveFailure {
    pub fn new(path: PathBuf, error: impl std::fmt::Display) -> Self {
        tracing::warn!("Failed to write {}: {}", path.display(), error);
        Self {
            path,
            error: error.to_string(),
        }
    }
}

/// Outcome of saving a batch: what was written and what was not.
#[derive(Debug, Default)]
pub struct BatchSave {
    pub written: Vec<PathBuf>,
    pub failures: Vec<SaveFailure>,
}

/// Writes `content`, creating missing parent directories first.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

pub fn transcript_file_name(video: &VideoId, format: OutputFormat) -> String {
    format!("{}_transcript.{}", video, format.extension())
}

pub fn save_transcript(
    dir: &Path,
    video: &VideoId,
    segments: &[TranscriptSegment],
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let path = dir.join(transcript_file_name(video, format));
    let mut content = render(format, video, segments, options)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    write_output(&path, &content)?;
    Ok(path)
}

/// Saves every successful transcript of a batch. A file that cannot be
/// written is recorded and the rest are still attempted.
pub fn save_batch_transcripts(
    dir: &Path,
    result: &BatchResult,
    format: OutputFormat,
    options: &RenderOptions,
) -> BatchSave {
    let mut save = BatchSave::default();

    if let Err(e) = std::fs::create_dir_all(dir) {
        save.failures = result
            .successes()
            .map(|(video, _)| SaveFailure::new(dir.join(transcript_file_name(video, format)), &e))
            .collect();
        return save;
    }

    for (video, segments) in result.successes() {
        match save_transcript(dir, video, segments, format, options) {
            Ok(path) => save.written.push(path),
            Err(e) => save.failures.push(SaveFailure::new(
                dir.join(transcript_file_name(video, format)),
                e,
            )),
        }
    }
    save
}

pub fn save_batch_results(path: &Path, result: &BatchResult, pretty: bool) -> Result<()> {
    let json = output::to_json(result, pretty)?;
    write_output(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchEntry, VideoResult};
    use crate::error::FailureKind;
    use crate::extractor::{ExtractionFailure, ExtractionOutcome};
    use tempfile::TempDir;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("0:00", "hello"),
            TranscriptSegment::new("0:03", "world"),
        ]
    }

    fn batch() -> BatchResult {
        let now = chrono::Utc::now();
        BatchResult {
            entries: vec![
                BatchEntry {
                    video_id: VideoId::parse("okvideo").unwrap(),
                    result: VideoResult::from_outcome(ExtractionOutcome::Success(segments()), 1),
                },
                BatchEntry {
                    video_id: VideoId::parse("badvideo").unwrap(),
                    result: VideoResult::from_outcome(
                        ExtractionOutcome::Failure(ExtractionFailure {
                            kind: FailureKind::VideoNotFound,
                            message: "Video badvideo not accessible".into(),
                        }),
                        3,
                    ),
                },
            ],
            started_at: now,
            finished_at: now,
            interrupted: false,
        }
    }

    #[test]
    fn test_write_output_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.txt");

        write_output(&path, "0:00 hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0:00 hello");
    }

    #[test]
    fn test_save_transcript_naming() {
        let dir = TempDir::new().unwrap();
        let video = VideoId::parse("abc123").unwrap();

        let path = save_transcript(
            dir.path(),
            &video,
            &segments(),
            OutputFormat::Text,
            &RenderOptions::default(),
        )
        .unwrap();

        assert_eq!(path.file_name().unwrap(), "abc123_transcript.txt");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "0:00 hello\n0:03 world\n"
        );
    }

    #[test]
    fn test_save_batch_transcripts_only_successes() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("transcripts");

        let save =
            save_batch_transcripts(&out, &batch(), OutputFormat::Srt, &RenderOptions::default());

        assert!(save.failures.is_empty());
        assert_eq!(save.written.len(), 1);
        assert!(out.join("okvideo_transcript.srt").exists());
        assert!(!out.join("badvideo_transcript.srt").exists());
    }

    #[test]
    fn test_save_batch_transcripts_unwritable_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let out = blocker.join("transcripts");

        let save =
            save_batch_transcripts(&out, &batch(), OutputFormat::Text, &RenderOptions::default());

        assert!(save.written.is_empty());
        assert_eq!(save.failures.len(), 1);
        assert_eq!(save.failures[0].path, out.join("okvideo_transcript.txt"));
    }

    #[test]
    fn test_save_batch_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        save_batch_results(&path, &batch(), true).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["okvideo"]["success"], true);
        assert_eq!(value["okvideo"]["attempts"], 1);
        assert_eq!(value["badvideo"]["error"], "Video badvideo not accessible");
        assert_eq!(value["badvideo"]["error_kind"], "video_not_found");
        assert_eq!(value["badvideo"]["attempts"], 3);
    }
}
