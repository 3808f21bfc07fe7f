pub mod commands;
pub mod dispatch;

use crate::config::{BrowserEngine, Config, ConfigOverrides};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "transcript-grabber")]
#[command(version, about = "Extract YouTube transcripts through a real browser")]
#[command(
    long_about = "Drives a Chromium-family browser through the YouTube watch page to open and read the transcript panel, for one video or a batch with retries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<commands::Command>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        env = "TRANSCRIPT_GRABBER_CONFIG",
        help = "Path to config file"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Run the browser headless")]
    pub headless: Option<bool>,

    #[arg(long, global = true, help = "Browser to drive: chromium, chrome, edge")]
    pub browser: Option<BrowserEngine>,

    #[arg(long, global = true, help = "Path to browser executable")]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, global = true, help = "Page load timeout in milliseconds")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, help = "Delay before each browser action in milliseconds")]
    pub slow_mo: Option<u64>,
}

impl Cli {
    pub fn with_env_context(mut self) -> Self {
        if !self.json {
            self.json = std::env::var("TRANSCRIPT_GRABBER_JSON")
                .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
                .unwrap_or(false);
        }

        self
    }

    /// Flags that take precedence over every config layer.
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides {
            headless: self.headless,
            engine: self.browser,
            chrome_path: self.chrome_path.clone(),
            timeout_ms: self.timeout,
            slow_mo_ms: self.slow_mo,
            ..Default::default()
        };

        match self.command {
            Some(commands::Command::Extract { chapter_length, .. }) => {
                overrides.chapter_length = chapter_length;
            }
            Some(commands::Command::Batch {
                max_retries,
                delay,
                backoff,
                concurrency,
                ..
            }) => {
                overrides.max_retries = max_retries;
                overrides.inter_request_delay_ms = delay;
                overrides.retry_backoff_ms = backoff;
                overrides.concurrency = concurrency;
            }
            _ => {}
        }

        overrides
    }
}

pub async fn run() -> crate::Result<()> {
    let cli = Cli::parse().with_env_context();

    let config = match cli.config {
        Some(ref config_path) => Config::load_from_file(config_path)?,
        None => Config::load()?,
    };

    let config = Arc::new(config.load_with_overrides(cli.overrides()));
    config.validate()?;

    dispatch::dispatch(cli, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "transcript-grabber",
            "--headless",
            "false",
            "extract",
            "dQw4w9WgXcQ",
            "-f",
            "srt",
            "-o",
            "out/t.srt",
        ])
        .unwrap();

        assert_eq!(cli.headless, Some(false));
        match cli.command {
            Some(commands::Command::Extract {
                ref video,
                format,
                ref output,
                ..
            }) => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(format, Some(crate::transcript::OutputFormat::Srt));
                assert_eq!(output.as_deref(), Some(std::path::Path::new("out/t.srt")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_batch_overrides() {
        let cli = Cli::try_parse_from([
            "transcript-grabber",
            "batch",
            "a",
            "b",
            "--max-retries",
            "2",
            "--delay",
            "100",
            "--backoff",
            "900",
            "--concurrency",
            "3",
            "--browser",
            "edge",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.max_retries, Some(2));
        assert_eq!(overrides.inter_request_delay_ms, Some(100));
        assert_eq!(overrides.retry_backoff_ms, Some(900));
        assert_eq!(overrides.concurrency, Some(3));
        assert_eq!(overrides.engine, Some(BrowserEngine::Edge));
        assert_eq!(overrides.chapter_length, None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["transcript-grabber", "config", "show", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_invalid_browser_rejected() {
        let result =
            Cli::try_parse_from(["transcript-grabber", "--browser", "firefox", "extract", "x"]);
        assert!(result.is_err());
    }
}
