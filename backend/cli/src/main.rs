mod recognize_cmd;
mod runtime;
mod serve_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use textgate_logging::init_logger;

#[derive(Parser)]
#[command(name = "textgate")]
#[command(about = "textgate: admission-controlled OCR service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP recognition server
    Serve {
        /// Config file (defaults to TEXTGATE_CONFIG, ./textgate.yaml, ~/.textgate/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Recognize text in a single image file and print the outcome as JSON
    Recognize {
        /// Image file to recognize
        file: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the health of a running server
    Status {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
        /// Print the raw health JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let ok = runtime::block_on_detached(run(cli))??;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run(cli: Cli) -> Result<bool> {
    let ok = match cli.command {
        Commands::Serve { config, bind, port } => {
            let config = runtime::load(config.as_deref(), bind, port).await?;
            init_logger(&config.logging).context("Failed to initialize logging")?;
            serve_cmd::run(config).await?;
            true
        }
        Commands::Recognize { file, config } => {
            let config = runtime::load(config.as_deref(), None, None).await?;
            init_logger(&config.logging).context("Failed to initialize logging")?;
            recognize_cmd::run(config, &file).await?
        }
        Commands::Status { host, port, json } => status_cmd::run(&host, port, json).await?,
    };

    Ok(ok)
}
