use crate::{
    Result,
    config::Config,
    driver::SessionLauncher,
    extractor::Extractor,
    output, persist,
    transcript::{OutputFormat, TranscriptSegment, format::RenderOptions, format::render},
    video::VideoId,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct ExtractReport {
    pub video_id: VideoId,
    pub format: OutputFormat,
    pub segment_count: usize,
    pub output: Option<PathBuf>,
    pub transcript: Vec<TranscriptSegment>,
    #[serde(skip)]
    pub rendered: String,
}

impl output::OutputFormatter for ExtractReport {
    fn format_text(&self) -> String {
        use crate::output::text;
        match self.output {
            Some(ref path) => text::success(&format!(
                "Saved {} segments for {} to {}",
                self.segment_count,
                self.video_id,
                path.display()
            )),
            None => self.rendered.clone(),
        }
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

pub fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        base_url: config.extraction.base_url.clone(),
        chapter_length: config.output.chapter_length,
        json_pretty: config.output.json_pretty,
    }
}

/// Extracts one transcript, writing it to `output` when given. Classified
/// failures come back as `VideoNotFound`/`TranscriptNotFound` errors.
pub async fn handle_extract<L: SessionLauncher>(
    extractor: &Extractor<L>,
    config: &Config,
    video: VideoId,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<ExtractReport> {
    let segments = extractor.try_extract(&video).await?;
    let rendered = render(format, &video, &segments, &render_options(config))?;

    if let Some(ref path) = output {
        persist::write_output(path, &rendered)?;
    }

    Ok(ExtractReport {
        segment_count: segments.len(),
        video_id: video,
        format,
        output,
        transcript: segments,
        rendered,
    })
}
