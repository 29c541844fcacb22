use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::{health, session, token};
use utils::client::ApiClient;

/// Trellis CLI - Command line interface for the Trellis API
#[derive(Parser)]
#[command(name = "trl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the Trellis server
    #[arg(
        long,
        global = true,
        env = "TRELLIS_URL",
        default_value = "http://localhost:3030"
    )]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health and status
    Health {
        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Log in by email and print the session token
    Login {
        email: String,

        /// Print only the token
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the user and permissions behind a session token
    Whoami {
        #[arg(long, env = "TRELLIS_TOKEN")]
        token: String,
    },

    /// Session token utilities (offline)
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Decode a session token into its user id and session id
    Inspect {
        token: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Build a session token for a user id
    Mint { user_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Health { format } => {
            health::execute(&ApiClient::new(&cli.url)?, &format).await?;
        }
        Commands::Login { email, quiet } => {
            session::login(&ApiClient::new(&cli.url)?, &email, quiet).await?;
        }
        Commands::Whoami { token } => {
            session::whoami(&ApiClient::new(&cli.url)?, &token).await?;
        }
        Commands::Token { action } => match action {
            TokenAction::Inspect { token, format } => token::inspect(&token, &format)?,
            TokenAction::Mint { user_id } => token::mint(&user_id)?,
        },
    }

    Ok(())
}
