use crate::transcript::OutputFormat;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Extract the transcript of one video")]
    Extract {
        #[arg(help = "Video id or URL")]
        video: String,
        #[arg(short, long, help = "Write the transcript to this file")]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, help = "Output format")]
        format: Option<OutputFormat>,
        #[arg(long, help = "Segments per chapter (chapters format)")]
        chapter_length: Option<usize>,
    },

    #[command(about = "Extract transcripts for many videos with retries")]
    Batch {
        #[arg(help = "Video ids or URLs")]
        videos: Vec<String>,
        #[arg(long, help = "File with one video id or URL per line")]
        file: Option<PathBuf>,
        #[arg(long, help = "Save each transcript as {id}_transcript.{ext} here")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Save aggregate results as JSON")]
        results: Option<PathBuf>,
        #[arg(long, help = "Attempts per video")]
        max_retries: Option<u32>,
        #[arg(long, help = "Delay between videos in milliseconds")]
        delay: Option<u64>,
        #[arg(long, help = "Delay between retries in milliseconds")]
        backoff: Option<u64>,
        #[arg(long, help = "Videos processed in parallel (1-8)")]
        concurrency: Option<usize>,
        #[arg(short, long, value_enum, help = "Format of saved transcripts")]
        format: Option<OutputFormat>,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    #[command(about = "Initialize config file with defaults")]
    Init,

    #[command(about = "Show effective configuration")]
    Show,

    #[command(about = "Edit configuration file")]
    Edit,

    #[command(about = "Show config file path")]
    Path,
}
