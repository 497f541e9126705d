mod ipc;
mod logging;
mod project;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use logging::{LogConfig, init_logging};
use std::path::PathBuf;
use tokio::io::{stdin, stdout};
use tracing::info;

use ipc::{BackendServer, StdioTransport};

/// CLI arguments for the code model backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (overrides RUST_LOG env var)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log file path (overrides CODEMODEL_LOG_FILE env var)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging with configuration from env vars and CLI args
    let log_config = LogConfig::from_env().with_overrides(args.log_level, args.log_file);

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!("Starting code model backend (pid: {})", std::process::id());

    // The host owns the other end of our stdio pipes
    let transport = StdioTransport::new(stdin(), stdout());
    let mut server = BackendServer::new(transport);

    server.run().await?;

    info!("Code model backend shut down");

    Ok(())
}
