//! Output representations of an extracted transcript.
//!
//! Everything here is a pure function over already extracted segments.

use super::TranscriptSegment;
use crate::{Result, output, video::VideoId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SRT_LAST_CUE_SECS: u64 = 3;
const CHAPTER_PREVIEW_CHARS: usize = 200;
const MIN_WORD_CHARS: usize = 3;

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w+\b").expect("word pattern is a valid regex"));

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// "{timestamp} {text}" per line
    #[default]
    Text,
    /// Text only, joined by spaces
    Plain,
    /// "[{timestamp}] {text}" per line
    Timestamped,
    /// List of {timestamp, text} objects
    Json,
    /// JSON with video metadata and per-segment statistics
    Detailed,
    /// SubRip subtitles
    Srt,
    /// Word frequency table
    Words,
    /// Chapter summaries as JSON
    Chapters,
    /// Debug representation of (timestamp, text) pairs
    Raw,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json | Self::Detailed | Self::Chapters => "json",
            Self::Srt => "srt",
            _ => "txt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Plain => "plain",
            Self::Timestamped => "timestamped",
            Self::Json => "json",
            Self::Detailed => "detailed",
            Self::Srt => "srt",
            Self::Words => "words",
            Self::Chapters => "chapters",
            Self::Raw => "raw",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub base_url: String,
    pub chapter_length: usize,
    pub json_pretty: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            chapter_length: 10,
            json_pretty: true,
        }
    }
}

pub fn render(
    format: OutputFormat,
    video: &VideoId,
    segments: &[TranscriptSegment],
    options: &RenderOptions,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => to_text(segments),
        OutputFormat::Plain => to_plain(segments),
        OutputFormat::Timestamped => to_timestamped(segments),
        OutputFormat::Json => output::to_json(&segments, options.json_pretty)?,
        OutputFormat::Detailed => {
            output::to_json(&detailed(video, segments, &options.base_url), options.json_pretty)?
        }
        OutputFormat::Srt => to_srt(segments),
        OutputFormat::Words => word_frequency(segments)
            .iter()
            .map(|(word, count)| format!("{}: {}", word, count))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Chapters => output::to_json(
            &chapters(segments, options.chapter_length),
            options.json_pretty,
        )?,
        OutputFormat::Raw => to_raw(segments),
    };
    Ok(rendered)
}

pub fn to_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("{} {}", s.timestamp, s.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_plain(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn to_timestamped(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("[{}] {}", s.timestamp, s.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_raw(segments: &[TranscriptSegment]) -> String {
    let pairs: Vec<(&str, &str)> = segments.iter().map(TranscriptSegment::as_pair).collect();
    format!("{:?}", pairs)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailedTranscript {
    pub video_id: String,
    pub video_url: String,
    pub transcript_count: usize,
    pub total_text_length: usize,
    pub segments: Vec<DetailedSegment>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailedSegment {
    pub index: usize,
    pub timestamp: String,
    pub text: String,
    pub text_length: usize,
    pub word_count: usize,
}

pub fn detailed(video: &VideoId, segments: &[TranscriptSegment], base_url: &str) -> DetailedTranscript {
    DetailedTranscript {
        video_id: video.to_string(),
        video_url: video.watch_url(base_url),
        transcript_count: segments.len(),
        total_text_length: segments.iter().map(|s| s.text.chars().count()).sum(),
        segments: segments
            .iter()
            .enumerate()
            .map(|(index, s)| DetailedSegment {
                index,
                timestamp: s.timestamp.clone(),
                text: s.text.clone(),
                text_length: s.text.chars().count(),
                word_count: s.text.split_whitespace().count(),
            })
            .collect(),
    }
}

/// Seconds for `M:SS`, `MM:SS` or `H:MM:SS` labels.
pub fn parse_timestamp(label: &str) -> Option<u64> {
    let parts = label
        .trim()
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [minutes, seconds] => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(*seconds),
        _ => None,
    }
}

fn srt_time(total_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02},000",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

pub fn to_srt(segments: &[TranscriptSegment]) -> String {
    let mut cues = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let start = parse_timestamp(&segment.timestamp).unwrap_or(0);
        let end = match segments.get(i + 1) {
            Some(next) => parse_timestamp(&next.timestamp).unwrap_or(0),
            None => start + SRT_LAST_CUE_SECS,
        };

        cues.push(format!(
            "{}\n{} --> {}\n{}\n",
            i + 1,
            srt_time(start),
            srt_time(end),
            segment.text
        ));
    }

    cues.join("\n")
}

/// Lowercased word counts, most frequent first. Ties keep first-seen order.
pub fn word_frequency(segments: &[TranscriptSegment]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for segment in segments {
        let lowered = segment.text.to_lowercase();
        for word in WORD.find_iter(&lowered).map(|m| m.as_str()) {
            if word.chars().count() < MIN_WORD_CHARS {
                continue;
            }
            match counts.get_mut(word) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(word.to_string(), 1);
                    order.push(word.to_string());
                }
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|word| {
            let count = counts.get(&word).copied().unwrap_or_default();
            (word, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Chapter {
    pub chapter: usize,
    pub start_time: String,
    pub end_time: String,
    pub segment_count: usize,
    pub text: String,
    pub full_text: String,
}

pub fn chapters(segments: &[TranscriptSegment], chapter_length: usize) -> Vec<Chapter> {
    segments
        .chunks(chapter_length.max(1))
        .enumerate()
        .map(|(i, chunk)| {
            let start_time = chunk[0].timestamp.clone();
            let end_time = chunk
                .last()
                .map(|s| s.timestamp.clone())
                .unwrap_or_else(|| start_time.clone());
            let full_text = to_plain(chunk);
            let text = if full_text.chars().count() > CHAPTER_PREVIEW_CHARS {
                let preview: String = full_text.chars().take(CHAPTER_PREVIEW_CHARS).collect();
                format!("{}...", preview)
            } else {
                full_text.clone()
            };

            Chapter {
                chapter: i + 1,
                start_time,
                end_time,
                segment_count: chunk.len(),
                text,
                full_text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("0:00", "Hello world"),
            TranscriptSegment::new("0:05", "This is a test"),
        ]
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&sample()), "0:00 Hello world\n0:05 This is a test");
    }

    #[test]
    fn test_empty_segments() {
        assert_eq!(to_text(&[]), "");
        assert_eq!(to_plain(&[]), "");
        assert_eq!(to_srt(&[]), "");
        assert!(chapters(&[], 10).is_empty());
    }

    #[test]
    fn test_to_plain_and_timestamped() {
        assert_eq!(to_plain(&sample()), "Hello world This is a test");
        assert_eq!(
            to_timestamped(&sample()),
            "[0:00] Hello world\n[0:05] This is a test"
        );
    }

    #[test]
    fn test_json_render() {
        let video = VideoId::parse("abc").unwrap();
        let json = render(
            OutputFormat::Json,
            &video,
            &sample(),
            &RenderOptions::default(),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"timestamp": "0:00", "text": "Hello world"},
                {"timestamp": "0:05", "text": "This is a test"}
            ])
        );
    }

    #[test]
    fn test_detailed() {
        let video = VideoId::parse("abc").unwrap();
        let doc = detailed(&video, &sample(), "https://www.youtube.com");
        assert_eq!(doc.video_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(doc.transcript_count, 2);
        assert_eq!(doc.total_text_length, 25);
        assert_eq!(doc.segments[1].word_count, 4);
        assert_eq!(doc.segments[1].index, 1);
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("0:05"), Some(5));
        assert_eq!(parse_timestamp("12:34"), Some(754));
        assert_eq!(parse_timestamp("1:02:03"), Some(3723));
        assert_eq!(parse_timestamp("[3]"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_timestamp_overflow_is_none() {
        let huge = u64::MAX.to_string();
        assert_eq!(parse_timestamp(&format!("{huge}:00")), None);
        assert_eq!(parse_timestamp(&format!("{huge}:00:00")), None);
        assert_eq!(parse_timestamp(&format!("0:{huge}:00")), None);
        assert_eq!(parse_timestamp(&format!("0:59:{huge}")), None);
    }

    #[test]
    fn test_to_srt() {
        let srt = to_srt(&sample());
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:05,000\nHello world\n\n\
             2\n00:00:05,000 --> 00:00:08,000\nThis is a test\n"
        );
    }

    #[test]
    fn test_srt_last_cue_wraps_minute() {
        let srt = to_srt(&[TranscriptSegment::new("59:58", "end")]);
        assert!(srt.contains("00:59:58,000 --> 01:00:01,000"));
    }

    #[test]
    fn test_word_frequency() {
        let segments = vec![
            TranscriptSegment::new("0:00", "The cat and the dog"),
            TranscriptSegment::new("0:01", "a DOG, the end"),
        ];
        let freq = word_frequency(&segments);
        assert_eq!(freq[0], ("the".to_string(), 3));
        assert_eq!(freq[1], ("dog".to_string(), 2));
        assert_eq!(freq[2], ("cat".to_string(), 1));
        assert!(!freq.iter().any(|(w, _)| w == "a"));
    }

    #[test]
    fn test_chapters() {
        let segments: Vec<TranscriptSegment> = (0..5)
            .map(|i| TranscriptSegment::new(format!("0:0{}", i), format!("line {}", i)))
            .collect();
        let result = chapters(&segments, 2);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].start_time, "0:00");
        assert_eq!(result[0].end_time, "0:01");
        assert_eq!(result[2].segment_count, 1);
        assert_eq!(result[2].start_time, result[2].end_time);
        assert_eq!(result[0].full_text, "line 0 line 1");
    }

    #[test]
    fn test_chapter_preview_truncated() {
        let long = "x".repeat(250);
        let result = chapters(&[TranscriptSegment::new("0:00", long.clone())], 10);
        assert_eq!(result[0].text.chars().count(), 203);
        assert!(result[0].text.ends_with("..."));
        assert_eq!(result[0].full_text, long);
    }

    #[test]
    fn test_raw() {
        assert_eq!(
            to_raw(&sample()),
            r#"[("0:00", "Hello world"), ("0:05", "This is a test")]"#
        );
    }

    #[test]
    fn test_extension() {
        assert_eq!(OutputFormat::Srt.extension(), "srt");
        assert_eq!(OutputFormat::Detailed.extension(), "json");
        assert_eq!(OutputFormat::Plain.extension(), "txt");
    }
}
