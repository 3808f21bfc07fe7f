use super::{
    Cli,
    commands::{Command, ConfigCommand},
};
use crate::{
    Result,
    batch::{BatchOptions, BatchRunner},
    config::Config,
    driver::ChromeLauncher,
    extractor::Extractor,
    handlers, output,
    utils::signal::{self, ShutdownSignal},
    video::VideoId,
};
use std::sync::Arc;

fn build_extractor(config: &Arc<Config>, shutdown: &ShutdownSignal) -> Extractor<ChromeLauncher> {
    Extractor::new(ChromeLauncher::new(Arc::clone(config)), config).with_shutdown(shutdown.clone())
}

pub async fn dispatch(mut cli: Cli, config: Arc<Config>) -> Result<()> {
    let command = match cli.command.take() {
        Some(cmd) => cmd,
        None => {
            eprintln!("No command provided. Use --help for usage.");
            std::process::exit(1);
        }
    };

    match command {
        Command::Extract {
            video,
            output,
            format,
            ..
        } => {
            let video = VideoId::parse(&video)?;
            let format = format.unwrap_or(config.output.default_format);
            handle_extract_command(video, format, output, &cli, &config).await
        }
        Command::Batch {
            videos,
            file,
            output_dir,
            results,
            format,
            ..
        } => {
            let request = handlers::batch::BatchRequest {
                videos,
                file,
                output_dir,
                results,
                format: format.unwrap_or(config.output.default_format),
            };
            handle_batch_command(request, &cli, &config).await
        }
        Command::Config { subcommand } => handle_config_command(subcommand, &cli, &config),
    }
}

async fn handle_extract_command(
    video: VideoId,
    format: crate::transcript::OutputFormat,
    output_path: Option<std::path::PathBuf>,
    cli: &Cli,
    config: &Arc<Config>,
) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    signal::setup_handlers(shutdown.clone())?;

    let extractor = build_extractor(config, &shutdown);
    let report =
        handlers::extract::handle_extract(&extractor, config, video, format, output_path).await?;
    output::print_output(&report, cli.json, config.output.json_pretty)
}

async fn handle_batch_command(
    request: handlers::batch::BatchRequest,
    cli: &Cli,
    config: &Arc<Config>,
) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    signal::setup_handlers(shutdown.clone())?;

    let runner = BatchRunner::new(build_extractor(config, &shutdown), BatchOptions::from(&config.batch))
        .with_shutdown(shutdown)
        .with_progress(|entry, index, total| {
            eprintln!("{}", handlers::batch::progress_line(entry, index, total));
        });

    let (_, report) = handlers::batch::handle_batch(&runner, config, request).await?;
    output::print_output(&report, cli.json, config.output.json_pretty)?;

    match report.exit_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_config_command(subcommand: ConfigCommand, cli: &Cli, config: &Config) -> Result<()> {
    match subcommand {
        ConfigCommand::Init => {
            let result = handlers::config_handler::handle_config_init()?;
            output::print_output(&result, cli.json, true)
        }
        ConfigCommand::Show => {
            let result = handlers::config_handler::handle_config_show(config)?;
            output::print_output(&result, cli.json, true)
        }
        ConfigCommand::Edit => {
            let result = handlers::config_handler::handle_config_edit()?;
            output::print_output(&result, cli.json, true)
        }
        ConfigCommand::Path => {
            let result = handlers::config_handler::handle_config_path()?;
            output::print_output(&result, cli.json, true)
        }
    }
}
