//! Curio CLI - catalog tools for operators.
//!
//! # Usage
//!
//! ```bash
//! # List every product, newest first
//! curio products list
//!
//! # Only art pieces
//! curio products list --category art
//!
//! # Check a seed file without writing anything
//! curio products seed catalog.yaml --dry-run
//!
//! # Create every product in the file (signs in as an admin)
//! curio products seed catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` / `BACKEND_ANON_KEY` - Backend connection
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - Admin account used by `seed`
//! - `PRICE_UNIT` - Currency label for `list` (default `MAD`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use curio_backend::{BackendClient, BackendConfig};
use curio_core::CategoryFilter;
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "curio")]
#[command(author, version, about = "Curio catalog tools")]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Backend connection settings.
#[derive(Args)]
struct BackendArgs {
    /// Backend base URL
    #[arg(long, env = "BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Backend public API key
    #[arg(long, env = "BACKEND_ANON_KEY", hide_env_values = true, global = true)]
    anon_key: Option<String>,
}

impl BackendArgs {
    fn client(self) -> Result<BackendClient, commands::CliError> {
        let url = self
            .backend_url
            .ok_or(commands::CliError::MissingSetting("BACKEND_URL"))?;
        let key = self
            .anon_key
            .ok_or(commands::CliError::MissingSetting("BACKEND_ANON_KEY"))?;
        let config = BackendConfig::new(&url, SecretString::from(key))?;
        Ok(BackendClient::new(&config)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Work with the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, newest first
    List {
        /// Only show one category (`figure` or `art`)
        #[arg(short, long)]
        category: Option<String>,

        /// Currency label printed after prices
        #[arg(long, env = "PRICE_UNIT", default_value = "MAD")]
        unit: String,
    },
    /// Create products from a YAML file
    Seed {
        /// Path to the YAML file
        file: PathBuf,

        /// Validate the file and stop before signing in
        #[arg(long)]
        dry_run: bool,

        /// Admin email
        #[arg(long, env = "ADMIN_EMAIL")]
        email: Option<String>,

        /// Admin password
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List { category, unit } => {
                let filter = match category.as_deref() {
                    Some(raw) => CategoryFilter::Only(raw.parse()?),
                    None => CategoryFilter::All,
                };
                let client = cli.backend.client()?;
                let mut out = std::io::stdout().lock();
                commands::products::list(&client, filter, &unit, &mut out).await?;
            }
            ProductsAction::Seed {
                file,
                dry_run,
                email,
                password,
            } => {
                let content = tokio::fs::read_to_string(&file).await?;
                let drafts = commands::seed::parse_and_validate(&content)?;
                tracing::info!(path = %file.display(), products = drafts.len(), "Seed file is valid");
                if dry_run {
                    tracing::info!("Dry run: nothing written");
                    return Ok(());
                }

                let email = email.ok_or(commands::CliError::MissingSetting("ADMIN_EMAIL"))?;
                let password =
                    password.ok_or(commands::CliError::MissingSetting("ADMIN_PASSWORD"))?;
                let client = cli.backend.client()?;
                let created = commands::seed::seed(
                    &client,
                    &email,
                    &SecretString::from(password),
                    &drafts,
                )
                .await?;
                tracing::info!(created, "Seeding complete");
            }
        },
    }
    Ok(())
}
