use crate::{
    GrabberError, Result,
    config::{Config, ExtractionConfig, SelectorConfig},
    driver::{Locator, PageDriver, SessionLauncher},
    error::FailureKind,
    timeouts::ms,
    transcript::{TranscriptSegment, parse_segments},
    utils::signal::ShutdownSignal,
    video::VideoId,
};
use serde::Serialize;
use std::time::Duration;

/// Steps of a single extraction attempt, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Navigate,
    ConfirmTitle,
    ExpandDescription,
    AwaitTranscriptButton,
    OpenTranscript,
    AwaitSegments,
    Parse,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Navigate => "navigate",
            Self::ConfirmTitle => "confirm-title",
            Self::ExpandDescription => "expand-description",
            Self::AwaitTranscriptButton => "await-transcript-button",
            Self::OpenTranscript => "open-transcript",
            Self::AwaitSegments => "await-segments",
            Self::Parse => "parse",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<GrabberError> for ExtractionFailure {
    fn from(err: GrabberError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Success(Vec<TranscriptSegment>),
    Failure(ExtractionFailure),
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn segments(&self) -> Option<&[TranscriptSegment]> {
        match self {
            Self::Success(segments) => Some(segments),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl From<Result<Vec<TranscriptSegment>>> for ExtractionOutcome {
    fn from(result: Result<Vec<TranscriptSegment>>) -> Self {
        match result {
            Ok(segments) => Self::Success(segments),
            Err(e) => Self::Failure(e.into()),
        }
    }
}

/// Runs the transcript extraction sequence against a fresh session per call.
pub struct Extractor<L: SessionLauncher> {
    launcher: L,
    extraction: ExtractionConfig,
    selectors: SelectorConfig,
    shutdown: Option<ShutdownSignal>,
}

impl<L: SessionLauncher> Extractor<L> {
    pub fn new(launcher: L, config: &Config) -> Self {
        Self {
            launcher,
            extraction: config.extraction.clone(),
            selectors: config.selectors.clone(),
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn shutdown(&self) -> Option<&ShutdownSignal> {
        self.shutdown.as_ref()
    }

    pub async fn extract(&self, video: &VideoId) -> ExtractionOutcome {
        self.try_extract(video).await.into()
    }

    /// Every error leaving this function is either one of the two
    /// classified "not found" conditions or a `Browser` error.
    pub async fn try_extract(&self, video: &VideoId) -> Result<Vec<TranscriptSegment>> {
        self.run_session(video)
            .await
            .map_err(GrabberError::into_classified)
    }

    async fn run_session(&self, video: &VideoId) -> Result<Vec<TranscriptSegment>> {
        let mut driver = self.launcher.launch().await?;

        let result = match self.shutdown {
            Some(ref shutdown) => {
                tokio::select! {
                    result = self.drive(&driver, video) => result,
                    _ = shutdown.triggered() => Err(GrabberError::Interrupted),
                }
            }
            None => self.drive(&driver, video).await,
        };

        if let Err(e) = driver.close_session().await {
            tracing::warn!("Failed to close browser session for {}: {}", video, e);
        }

        result
    }

    async fn drive<D: PageDriver>(
        &self,
        driver: &D,
        video: &VideoId,
    ) -> Result<Vec<TranscriptSegment>> {
        let url = video.watch_url(&self.extraction.base_url);
        let timeout = self.extraction.timeout();

        tracing::debug!("[{}] {}: {}", video, Stage::Navigate, url);
        tolerate_timeout(driver.navigate(&url, timeout).await, "navigation")?;
        tolerate_timeout(driver.await_quiescence(timeout).await, "page load")?;

        tracing::debug!("[{}] {}", video, Stage::ConfirmTitle);
        let title = Locator::css(&self.selectors.title);
        match driver
            .find_element(&title, Duration::from_millis(ms::TITLE_WAIT))
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => {
                return Err(GrabberError::VideoNotFound(format!(
                    "Video {} not accessible",
                    video
                )));
            }
        }

        tracing::debug!("[{}] {}", video, Stage::ExpandDescription);
        if let Err(e) = self.expand_description(driver).await {
            tracing::debug!("Could not expand description: {}", e);
        }

        tracing::debug!("[{}] {}", video, Stage::AwaitTranscriptButton);
        let button = Locator::role("button", &self.selectors.transcript_button_label);
        match driver
            .find_element(&button, Duration::from_millis(ms::TRANSCRIPT_BUTTON_WAIT))
            .await
        {
            Ok(Some(_)) => {}
            outcome => {
                if let Err(e) = outcome {
                    tracing::debug!("Transcript button wait failed: {}", e);
                }
                tracing::debug!("Transcript button not visible yet, pausing before retrying");
                driver
                    .pause(Duration::from_millis(ms::TRANSCRIPT_BUTTON_FALLBACK))
                    .await;
            }
        }

        tracing::debug!("[{}] {}", video, Stage::OpenTranscript);
        if let Err(e) = self.open_transcript_panel(driver, &button).await {
            tracing::debug!("Could not open transcript panel: {}", e);
            return Err(GrabberError::TranscriptNotFound(format!(
                "No transcript available for video {}",
                video
            )));
        }

        tracing::debug!("[{}] {}", video, Stage::AwaitSegments);
        let segment = Locator::css(&self.selectors.segment);
        if driver
            .find_element(&segment, Duration::from_millis(ms::SEGMENTS_WAIT))
            .await?
            .is_none()
        {
            return Err(GrabberError::WaitTimeout {
                target: self.selectors.segment.clone(),
                timeout_ms: ms::SEGMENTS_WAIT,
            });
        }

        tracing::debug!("[{}] {}", video, Stage::Parse);
        let handles = driver.find_all(&self.selectors.segment).await?;
        if handles.is_empty() {
            return Err(GrabberError::TranscriptNotFound(format!(
                "No transcript segments found for video {}",
                video
            )));
        }

        let segments = parse_segments(driver, &handles, &self.selectors).await;
        if segments.is_empty() {
            return Err(GrabberError::TranscriptNotFound(format!(
                "No transcript content extracted for video {}",
                video
            )));
        }

        tracing::info!("Extracted {} segments for {}", segments.len(), video);
        Ok(segments)
    }

    async fn expand_description<D: PageDriver>(&self, driver: &D) -> Result<()> {
        let expander = Locator::css(&self.selectors.description_expander);
        let handle = driver
            .find_element(&expander, Duration::from_millis(ms::DESCRIPTION_CLICK))
            .await?
            .ok_or_else(|| GrabberError::ElementNotFound {
                selector: expander.to_string(),
            })?;
        driver.click(&handle).await
    }

    async fn open_transcript_panel<D: PageDriver>(&self, driver: &D, button: &Locator) -> Result<()> {
        let handle = driver
            .find_element(button, Duration::from_millis(ms::TRANSCRIPT_BUTTON_CLICK))
            .await?
            .ok_or_else(|| GrabberError::ElementNotFound {
                selector: button.to_string(),
            })?;
        driver.click(&handle).await
    }
}

fn tolerate_timeout(result: Result<()>, step: &str) -> Result<()> {
    match result {
        Err(e) if e.is_timeout() => {
            tracing::warn!("{} timed out, continuing: {}", step, e);
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_classified_error() {
        let outcome: ExtractionOutcome =
            Err(GrabberError::TranscriptNotFound("No transcript available for video x".into()))
                .into();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::TranscriptNotFound);
        assert_eq!(failure.message, "No transcript available for video x");
        assert!(outcome.segments().is_none());
    }

    #[test]
    fn test_outcome_from_success() {
        let outcome: ExtractionOutcome = Ok(vec![TranscriptSegment::new("0:00", "hi")]).into();
        assert!(outcome.is_success());
        assert_eq!(outcome.segments().unwrap().len(), 1);
    }

    #[test]
    fn test_tolerate_timeout() {
        assert!(tolerate_timeout(Err(GrabberError::NavigationTimeout(10)), "navigation").is_ok());
        assert!(
            tolerate_timeout(Err(GrabberError::Connection("reset".into())), "navigation").is_err()
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = ExtractionFailure::from(GrabberError::VideoNotFound("Video x not accessible".into()));
        assert_eq!(failure.to_string(), "video_not_found: Video x not accessible");
    }
}
