use crate::{GrabberError, Result, transcript::format::OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const APP_DIR: &str = "transcript-grabber";
pub const PROJECT_CONFIG_FILE: &str = ".transcript-grabber.toml";
pub const MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Chromium-family browser to drive. All of them speak the DevTools protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Chrome,
    Edge,
}

impl std::str::FromStr for BrowserEngine {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chromium" => Ok(Self::Chromium),
            "chrome" | "google-chrome" => Ok(Self::Chrome),
            "edge" | "msedge" => Ok(Self::Edge),
            _ => Err(format!("Invalid browser: {} (use chromium, chrome, edge)", s)),
        }
    }
}

impl std::fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Chromium => "chromium",
            Self::Chrome => "chrome",
            Self::Edge => "edge",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub engine: BrowserEngine,
    pub chrome_path: Option<PathBuf>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default)]
    pub disable_web_security: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Global bound for navigation and load-state waits.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Delay inserted before each page interaction.
    #[serde(default = "default_slow_mo_ms")]
    pub slow_mo_ms: u64,
}

/// Page selectors for the watch page. Overridable because the site markup
/// changes more often than the interaction sequence does.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    #[serde(default = "default_title_selector")]
    pub title: String,
    #[serde(default = "default_description_expander")]
    pub description_expander: String,
    #[serde(default = "default_transcript_button_label")]
    pub transcript_button_label: String,
    #[serde(default = "default_segment_selector")]
    pub segment: String,
    #[serde(default = "default_segment_timestamp")]
    pub segment_timestamp: String,
    #[serde(default = "default_segment_text")]
    pub segment_text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_json_pretty")]
    pub json_pretty: bool,
    #[serde(default)]
    pub default_format: OutputFormat,
    #[serde(default = "default_chapter_length")]
    pub chapter_length: usize,
}

fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    800
}
fn default_base_url() -> String {
    "https://www.youtube.com".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_slow_mo_ms() -> u64 {
    100
}
fn default_title_selector() -> String {
    "h1.style-scope.ytd-watch-metadata".to_string()
}
fn default_description_expander() -> String {
    "#description-inline-expander".to_string()
}
fn default_transcript_button_label() -> String {
    "Show transcript".to_string()
}
fn default_segment_selector() -> String {
    "ytd-transcript-segment-renderer".to_string()
}
fn default_segment_timestamp() -> String {
    ".segment-timestamp".to_string()
}
fn default_segment_text() -> String {
    ".segment-text".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_inter_request_delay_ms() -> u64 {
    2000
}
fn default_retry_backoff_ms() -> u64 {
    5000
}
fn default_concurrency() -> usize {
    1
}
fn default_json_pretty() -> bool {
    true
}
fn default_chapter_length() -> usize {
    10
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::default(),
            chrome_path: None,
            headless: default_headless(),
            user_data_dir: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            disable_web_security: false,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            slow_mo_ms: default_slow_mo_ms(),
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn slow_mo(&self) -> Duration {
        Duration::from_millis(self.slow_mo_ms)
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: default_title_selector(),
            description_expander: default_description_expander(),
            transcript_button_label: default_transcript_button_label(),
            segment: default_segment_selector(),
            segment_timestamp: default_segment_timestamp(),
            segment_text: default_segment_text(),
        }
    }
}

impl SelectorConfig {
    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("title", &self.title),
            ("description_expander", &self.description_expander),
            ("transcript_button_label", &self.transcript_button_label),
            ("segment", &self.segment),
            ("segment_timestamp", &self.segment_timestamp),
            ("segment_text", &self.segment_text),
        ]
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            inter_request_delay_ms: default_inter_request_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty: default_json_pretty(),
            default_format: OutputFormat::default(),
            chapter_length: default_chapter_length(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    default_config_dir().map(|p| p.join("config.toml"))
}

pub fn default_config_dir() -> Result<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .map(|p| p.join(APP_DIR))
        .ok_or_else(|| GrabberError::ConfigError("Could not determine config directory".into()))
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let global_path = default_config_path()?;
        if global_path.exists() {
            let content = std::fs::read_to_string(&global_path)?;
            config = toml::from_str(&content)?;
        }

        let project_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            let content = std::fs::read_to_string(&project_path)?;
            let project_config: Config = toml::from_str(&content)?;
            config = config.merge(project_config);
        }

        config.load_from_env();

        Ok(config)
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.load_from_env();
        Ok(config)
    }

    pub fn load_with_overrides(&self, cli_overrides: ConfigOverrides) -> Self {
        let mut config = self.clone();

        if let Some(headless) = cli_overrides.headless {
            config.browser.headless = headless;
        }
        if let Some(engine) = cli_overrides.engine {
            config.browser.engine = engine;
        }
        if let Some(chrome_path) = cli_overrides.chrome_path {
            config.browser.chrome_path = Some(chrome_path);
        }
        if let Some(timeout) = cli_overrides.timeout_ms {
            config.extraction.timeout_ms = timeout;
        }
        if let Some(slow_mo) = cli_overrides.slow_mo_ms {
            config.extraction.slow_mo_ms = slow_mo;
        }
        if let Some(json) = cli_overrides.json_pretty {
            config.output.json_pretty = json;
        }
        if let Some(retries) = cli_overrides.max_retries {
            config.batch.max_retries = retries;
        }
        if let Some(delay) = cli_overrides.inter_request_delay_ms {
            config.batch.inter_request_delay_ms = delay;
        }
        if let Some(backoff) = cli_overrides.retry_backoff_ms {
            config.batch.retry_backoff_ms = backoff;
        }
        if let Some(concurrency) = cli_overrides.concurrency {
            config.batch.concurrency = concurrency;
        }
        if let Some(chapter_length) = cli_overrides.chapter_length {
            config.output.chapter_length = chapter_length;
        }

        config
    }

    /// Project-level values win over the global file wherever they differ
    /// from the built-in defaults.
    fn merge(mut self, other: Config) -> Self {
        let defaults = Config::default();

        if other.browser.chrome_path.is_some() {
            self.browser.chrome_path = other.browser.chrome_path;
        }
        if other.browser.user_data_dir.is_some() {
            self.browser.user_data_dir = other.browser.user_data_dir;
        }
        if other.browser.engine != defaults.browser.engine {
            self.browser.engine = other.browser.engine;
        }
        if other.browser.headless != defaults.browser.headless {
            self.browser.headless = other.browser.headless;
        }
        if other.browser.window_width != defaults.browser.window_width {
            self.browser.window_width = other.browser.window_width;
        }
        if other.browser.window_height != defaults.browser.window_height {
            self.browser.window_height = other.browser.window_height;
        }
        if other.browser.disable_web_security != defaults.browser.disable_web_security {
            self.browser.disable_web_security = other.browser.disable_web_security;
        }
        if other.extraction.base_url != defaults.extraction.base_url {
            self.extraction.base_url = other.extraction.base_url;
        }
        if other.extraction.timeout_ms != defaults.extraction.timeout_ms {
            self.extraction.timeout_ms = other.extraction.timeout_ms;
        }
        if other.extraction.slow_mo_ms != defaults.extraction.slow_mo_ms {
            self.extraction.slow_mo_ms = other.extraction.slow_mo_ms;
        }
        if other.batch.max_retries != defaults.batch.max_retries {
            self.batch.max_retries = other.batch.max_retries;
        }
        if other.batch.inter_request_delay_ms != defaults.batch.inter_request_delay_ms {
            self.batch.inter_request_delay_ms = other.batch.inter_request_delay_ms;
        }
        if other.batch.retry_backoff_ms != defaults.batch.retry_backoff_ms {
            self.batch.retry_backoff_ms = other.batch.retry_backoff_ms;
        }
        if other.batch.concurrency != defaults.batch.concurrency {
            self.batch.concurrency = other.batch.concurrency;
        }
        if other.output.json_pretty != defaults.output.json_pretty {
            self.output.json_pretty = other.output.json_pretty;
        }
        if other.output.default_format != defaults.output.default_format {
            self.output.default_format = other.output.default_format;
        }
        if other.output.chapter_length != defaults.output.chapter_length {
            self.output.chapter_length = other.output.chapter_length;
        }

        let default_selectors = defaults.selectors.entries();
        let project_selectors = other.selectors.entries();
        for ((name, value), (_, default_value)) in project_selectors.iter().zip(default_selectors) {
            if *value != default_value {
                self.selectors.set(name, value.to_string());
            }
        }

        self
    }

    fn load_from_env(&mut self) {
        if let Ok(headless) = std::env::var("TRANSCRIPT_GRABBER_HEADLESS") {
            self.browser.headless = headless == "true" || headless == "1";
        }
        if let Ok(engine) = std::env::var("TRANSCRIPT_GRABBER_BROWSER")
            && let Ok(engine) = engine.parse()
        {
            self.browser.engine = engine;
        }
        if let Ok(path) = std::env::var("TRANSCRIPT_GRABBER_CHROME_PATH") {
            self.browser.chrome_path = Some(PathBuf::from(path));
        }
        if let Ok(timeout) = std::env::var("TRANSCRIPT_GRABBER_TIMEOUT_MS")
            && let Ok(timeout) = timeout.parse()
        {
            self.extraction.timeout_ms = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extraction.timeout_ms == 0 {
            return Err(GrabberError::ConfigError(
                "timeout_ms must be greater than 0".into(),
            ));
        }

        if url::Url::parse(&self.extraction.base_url).is_err() {
            return Err(GrabberError::ConfigError(format!(
                "base_url is not a valid URL: {}",
                self.extraction.base_url
            )));
        }

        if self.batch.max_retries == 0 {
            return Err(GrabberError::ConfigError(
                "max_retries must be at least 1".into(),
            ));
        }

        if self.batch.retry_backoff_ms <= self.batch.inter_request_delay_ms {
            return Err(GrabberError::ConfigError(format!(
                "retry_backoff_ms ({}) must be greater than inter_request_delay_ms ({})",
                self.batch.retry_backoff_ms, self.batch.inter_request_delay_ms
            )));
        }

        if self.batch.concurrency == 0 || self.batch.concurrency > MAX_CONCURRENCY {
            return Err(GrabberError::ConfigError(format!(
                "concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }

        if self.output.chapter_length == 0 {
            return Err(GrabberError::ConfigError(
                "chapter_length must be greater than 0".into(),
            ));
        }

        for (name, value) in self.selectors.entries() {
            if value.trim().is_empty() {
                return Err(GrabberError::ConfigError(format!(
                    "selector '{}' must not be empty",
                    name
                )));
            }
        }

        if let Some(ref path) = self.browser.chrome_path
            && !path.exists()
        {
            return Err(GrabberError::ConfigError(format!(
                "Chrome path does not exist: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn show_masked(&self) -> String {
        format!(
            r#"Browser:
  Engine: {}
  Executable: {}
  Headless: {}
  User Data Dir: {}

Extraction:
  Base URL: {}
  Timeout: {}ms
  Slow-mo: {}ms

Selectors:
  Title: {}
  Description Expander: {}
  Transcript Button: "{}"
  Segment: {} ({} / {})

Batch:
  Max Retries: {}
  Inter-request Delay: {}ms
  Retry Backoff: {}ms
  Concurrency: {}

Output:
  Default Format: {}
  Chapter Length: {}
"#,
            self.browser.engine,
            self.browser
                .chrome_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto-detect".into()),
            self.browser.headless,
            self.browser
                .user_data_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "temporary".into()),
            self.extraction.base_url,
            self.extraction.timeout_ms,
            self.extraction.slow_mo_ms,
            self.selectors.title,
            self.selectors.description_expander,
            self.selectors.transcript_button_label,
            self.selectors.segment,
            self.selectors.segment_timestamp,
            self.selectors.segment_text,
            self.batch.max_retries,
            self.batch.inter_request_delay_ms,
            self.batch.retry_backoff_ms,
            self.batch.concurrency,
            self.output.default_format,
            self.output.chapter_length,
        )
    }
}

impl SelectorConfig {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "description_expander" => self.description_expander = value,
            "transcript_button_label" => self.transcript_button_label = value,
            "segment" => self.segment = value,
            "segment_timestamp" => self.segment_timestamp = value,
            "segment_text" => self.segment_text = value,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub headless: Option<bool>,
    pub engine: Option<BrowserEngine>,
    pub chrome_path: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub slow_mo_ms: Option<u64>,
    pub json_pretty: Option<bool>,
    pub max_retries: Option<u32>,
    pub inter_request_delay_ms: Option<u64>,
    pub retry_backoff_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub chapter_length: Option<usize>,
}
