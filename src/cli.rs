use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "favoritesd", about = "Pipeline favorites daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the favorites daemon
    Serve {
        /// JSON catalog describing the organization's items
        #[arg(long)]
        catalog: PathBuf,

        /// Socket path (default: $XDG_RUNTIME_DIR/favoritesd/server.sock)
        #[arg(long)]
        socket: Option<PathBuf>,
    },

    /// Talk to a running daemon
    Client(ClientArgs),
}

#[derive(Args)]
pub struct ClientArgs {
    /// Act as this user
    #[arg(long)]
    pub user: Option<String>,

    /// Socket path (default: $XDG_RUNTIME_DIR/favoritesd/server.sock)
    #[arg(long)]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ClientAction,
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Resolve the favorite for an item
    Get {
        /// Item full name, e.g. folder/job
        name: String,

        /// Link the favorite below this href instead of next to the item
        #[arg(long)]
        anchor: Option<String>,

        /// Print the favorite view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add or remove a favorite
    Toggle {
        /// Item full name, e.g. folder/job
        name: String,

        /// Add the favorite
        #[arg(long, conflicts_with = "off", required_unless_present = "off")]
        on: bool,

        /// Remove the favorite
        #[arg(long)]
        off: bool,
    },

    /// List the user's favorites
    List {
        /// Print the favorite views as JSON
        #[arg(long)]
        json: bool,
    },
}
