use clap::Parser;
use boardsync::cli::commands::Cli;
use boardsync::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `BSYNC_LOG=boardsync=debug`
const LOG_ENV: &str = "BSYNC_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
