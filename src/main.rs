use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use proxy_check_client::{
    logging,
    session::{ExportKind, ExportService, FilterMode, JobState, LogNotifier, RecordingNotifier},
    transport::{self, HttpApi},
    tui::SessionApp,
    ClientConfig, Command, SessionClient,
};
use std::path::PathBuf;
use std::time::Duration;

/// Terminal client for a streaming proxy checker server
#[derive(Parser)]
#[command(name = "proxy-check-client")]
#[command(about = "Upload proxy lists to a checker server and follow the results live")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the checker server
    #[arg(long, env = "PROXY_CHECK_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// URL of the stream channel
    #[arg(long, env = "PROXY_CHECK_STREAM", default_value = "ws://localhost:3000/ws")]
    stream: String,

    /// Directory for exported files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Timeout in seconds for upload and export requests
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive TUI
    Tui {
        /// File containing proxies
        #[arg(short, long)]
        file: PathBuf,
        /// URL to test proxies against
        #[arg(short, long)]
        target: String,
        /// Write logs to this file instead of the terminal
        #[arg(long, default_value = "proxy-check-client.log")]
        log_file: PathBuf,
    },
    /// Upload, check and optionally export without the TUI
    Run {
        /// File containing proxies
        #[arg(short, long)]
        file: PathBuf,
        /// URL to test proxies against
        #[arg(short, long)]
        target: String,
        /// Export results when the check finishes (all, valid, invalid)
        #[arg(short, long)]
        export: Option<ExportKind>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ClientConfig::new()
        .with_server_url(cli.server.clone())
        .with_stream_url(cli.stream.clone())
        .with_output_dir(cli.output_dir.clone())
        .with_request_timeout(Duration::from_secs(cli.timeout));

    match cli.command {
        Commands::Tui {
            file,
            target,
            log_file,
        } => {
            logging::init_file(&cli.log_level, &log_file)?;

            let api = HttpApi::new(&config)?;
            let connection = transport::connect(&config.stream_url).await?;
            let client = SessionClient::new(
                api,
                connection.sink,
                RecordingNotifier::new(),
                ExportService::new(&config.output_dir),
            );

            let mut app = SessionApp::new(client, connection.events, file, target);
            app.run().await?;
        }
        Commands::Run {
            file,
            target,
            export,
        } => {
            logging::init(&cli.log_level)?;

            let bytes = tokio::fs::read(&file).await?;
            let api = HttpApi::new(&config)?;
            let mut connection = transport::connect(&config.stream_url).await?;
            let mut client = SessionClient::new(
                api,
                connection.sink,
                LogNotifier,
                ExportService::new(&config.output_dir),
            );

            client.execute(Command::Upload(bytes)).await?;
            let count = client.controller().uploaded_proxies().map_or(0, |p| p.len());
            println!("Loaded {} proxies from {:?}", count, file);
            println!("Target URL: {}", target);
            println!();

            client.execute(Command::Start(target)).await?;
            let state = client.run_until_finished(&mut connection.events).await?;

            let aggregate = client.controller().aggregate();
            println!(
                "Results: {} valid, {} invalid ({} received)",
                aggregate.valid_count, aggregate.invalid_count, aggregate.total
            );

            if state == JobState::Cancelling {
                println!("Check cancelled before completion");
            }

            let valid = client.controller().store().project(FilterMode::Valid);
            if !valid.is_empty() {
                println!("\nWorking proxies:");
                for result in valid {
                    println!("  {} ({}ms)", result.proxy, result.response_time_ms);
                }
            }

            if let Some(kind) = export {
                client
                    .execute(Command::Export(kind))
                    .await
                    .map_err(|e| anyhow!("export of {} proxies failed: {}", kind, e))?;
                println!("Exported {} proxies to {:?}", kind, config.output_dir);
            }
        }
    }

    Ok(())
}
