mod catalog;
mod cli;
mod client;
mod favorite;
mod ipc;
mod resolver;
mod server;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { catalog, socket } => {
            if let Err(e) = server::run(&catalog, socket.as_deref()).await {
                tracing::error!(error = %e, "server failed");
                eprintln!("favoritesd serve: {e}");
                std::process::exit(1);
            }
        }
        Command::Client(args) => {
            if let Err(e) = client::run(args).await {
                tracing::error!(error = %e, "client failed");
                eprintln!("favoritesd client: {e}");
                std::process::exit(1);
            }
        }
    }
}
