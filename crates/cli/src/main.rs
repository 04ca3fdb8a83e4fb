//! Dokan CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! dokan-cli migrate
//!
//! # Create an admin (password from --password, DOKAN_ADMIN_PASSWORD or stdin)
//! dokan-cli admin create -e owner@dokan.com.bd -n "Owner" -r super_admin
//!
//! # Reset an admin's password
//! dokan-cli admin reset-password -e owner@dokan.com.bd
//!
//! # Load demo catalog, navbar and footer
//! dokan-cli seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin` - Create, list and reset admin accounts
//! - `seed` - Seed the database with demo data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dokan-cli")]
#[command(author, version, about = "Dokan CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed demo categories, products, navbar and footer
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Password (falls back to `DOKAN_ADMIN_PASSWORD`, then stdin)
        #[arg(long)]
        password: Option<String>,
    },
    /// Set a new password for an existing admin
    ResetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// New password (falls back to `DOKAN_ADMIN_PASSWORD`, then stdin)
        #[arg(long)]
        password: Option<String>,
    },
    /// List admin users
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create(&email, &name, &role, password).await?;
            }
            AdminAction::ResetPassword { email, password } => {
                commands::admin::reset_password(&email, password).await?;
            }
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
