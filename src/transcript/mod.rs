pub mod format;
pub mod parser;

use serde::{Deserialize, Serialize};

pub use format::OutputFormat;
pub use parser::{RawSegment, assemble_segments, parse_segments};

/// One rendered transcript row. `text` is never empty once a segment has
/// made it into a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub timestamp: String,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(timestamp: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            text: text.into(),
        }
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.timestamp, &self.text)
    }
}

impl<T: Into<String>, U: Into<String>> From<(T, U)> for TranscriptSegment {
    fn from((timestamp, text): (T, U)) -> Self {
        Self::new(timestamp, text)
    }
}
