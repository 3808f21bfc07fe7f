use super::TranscriptSegment;
use crate::{Result, config::SelectorConfig, driver::PageDriver};

/// What could be read from one rendered segment row before any cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSegment {
    pub timestamp: Option<String>,
    pub text: Option<String>,
}

impl RawSegment {
    pub fn new(timestamp: Option<&str>, text: Option<&str>) -> Self {
        Self {
            timestamp: timestamp.map(str::to_string),
            text: text.map(str::to_string),
        }
    }
}

/// Turns the row at `index` into a segment. Rows without text are dropped;
/// rows without a timestamp label get a positional placeholder.
pub fn assemble_segment(index: usize, raw: RawSegment) -> Option<TranscriptSegment> {
    let text = raw
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;

    let timestamp = match raw.timestamp {
        Some(label) => label.trim().to_string(),
        None => format!("[{}]", index),
    };

    Some(TranscriptSegment { timestamp, text })
}

/// Positions are taken from the input sequence, so a failed row still
/// occupies its index.
pub fn assemble_segments<I>(rows: I) -> Vec<TranscriptSegment>
where
    I: IntoIterator<Item = Result<RawSegment>>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match row {
            Ok(raw) => assemble_segment(index, raw),
            Err(e) => {
                tracing::warn!("Error extracting segment {}: {}", index, e);
                None
            }
        })
        .collect()
}

pub async fn parse_segments<D: PageDriver>(
    driver: &D,
    handles: &[D::Handle],
    selectors: &SelectorConfig,
) -> Vec<TranscriptSegment> {
    let mut rows = Vec::with_capacity(handles.len());
    for handle in handles {
        rows.push(read_segment(driver, handle, selectors).await);
    }

    let segments = assemble_segments(rows);
    tracing::debug!(
        "Parsed {} of {} segment rows",
        segments.len(),
        handles.len()
    );
    segments
}

async fn read_segment<D: PageDriver>(
    driver: &D,
    handle: &D::Handle,
    selectors: &SelectorConfig,
) -> Result<RawSegment> {
    let timestamp = match driver
        .find_within(handle, &selectors.segment_timestamp)
        .await?
    {
        Some(el) => Some(driver.read_text(&el).await?),
        None => None,
    };

    let text = match driver.find_within(handle, &selectors.segment_text).await? {
        Some(el) => Some(driver.read_text(&el).await?),
        None => None,
    };

    Ok(RawSegment { timestamp, text })
}
