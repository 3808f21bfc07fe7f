pub mod batch;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod js_templates;
pub mod output;
pub mod persist;
pub mod timeouts;
pub mod transcript;
pub mod utils;
pub mod video;

pub use batch::{BatchOptions, BatchResult, BatchRunner, TranscriptSource};
pub use config::{BrowserEngine, Config};
pub use error::{FailureKind, GrabberError};
pub use extractor::{ExtractionFailure, ExtractionOutcome, Extractor};
pub use transcript::TranscriptSegment;
pub use video::VideoId;

pub type Result<T> = std::result::Result<T, GrabberError>;
