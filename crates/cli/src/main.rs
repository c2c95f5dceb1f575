//! Paperback CLI - command-line client for the bookstore service.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog (no account needed)
//! paperback books list
//! paperback books search --title "dune" --category Science
//! paperback books show 42
//!
//! # Create and verify an account
//! paperback account signup -u reader -f Nour -l Hassan \
//!     -e reader@example.com -p "P@ssw0rd1" --phone 01012345678
//! paperback account verify -e reader@example.com --otp 123456
//!
//! # Authenticated commands take credentials from --email/--password or
//! # the PAPERBACK_EMAIL / PAPERBACK_PASSWORD environment variables
//! paperback cart add 42 --quantity 2
//! paperback cart show
//! paperback cart checkout --card-number 4111111111111111 \
//!     --card-holder "Nour Hassan" --expiry 12/30 --cvv 123
//! paperback orders history
//! ```
//!
//! Nothing is persisted between invocations: every authenticated command
//! performs a fresh login, mirroring the client's in-memory-only credential
//! model.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "paperback")]
#[command(author, version, about = "Paperback bookstore CLI")]
struct Cli {
    /// Account email for authenticated commands (or PAPERBACK_EMAIL)
    #[arg(long)]
    email: Option<String>,

    /// Account password for authenticated commands (or PAPERBACK_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage your account
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Browse and manage the catalog
    Books {
        #[command(subcommand)]
        action: commands::books::BooksAction,
    },
    /// Manage your shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Inspect orders
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let credentials = commands::Credentials {
        email: cli.email,
        password: cli.password,
    };

    match cli.command {
        Commands::Account { action } => commands::account::run(action, &credentials).await,
        Commands::Books { action } => commands::books::run(action, &credentials).await,
        Commands::Cart { action } => commands::cart::run(action, &credentials).await,
        Commands::Orders { action } => commands::orders::run(action, &credentials).await,
    }
}
