//! stockkeep - command line front end for the stock keeping store.
//!
//! Commands:
//! - `stockkeep add` - Register a product lot
//! - `stockkeep sell` - Record a sale against a product
//! - `stockkeep list` / `search` - Browse the catalog
//! - `stockkeep sales` - Sales history of one product
//! - `stockkeep report` - Items sold and added on a date
//! - `stockkeep purge` - Delete all data (admin only)
//! - `stockkeep hash-password` - Produce a hash for `STOCKKEEP_ADMIN_PASSWORD_HASH`

mod config;
mod input;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Password};

use stockkeep_auth::{Credentials, DEFAULT_HASH_COST, hash_password};
use stockkeep_infra::{InventoryService, SqliteInventoryStore};
use stockkeep_inventory::AddedWindow;

use crate::config::Config;
use crate::render::Output;

/// Track stock, sales and daily totals for a small shop.
#[derive(Parser)]
#[command(name = "stockkeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite database file (overrides STOCKKEEP_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new product lot
    Add {
        name: String,
        quantity: String,
        price: String,
    },

    /// Sell units of a product
    Sell { product_id: String, quantity: String },

    /// List every product
    List,

    /// Show the sales recorded against a product
    Sales { product_id: String },

    /// Find products whose name contains the query (case-insensitive)
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Items sold and items added on a date
    Report {
        day: String,
        month: String,
        year: String,

        /// Which registrations count as added (overrides STOCKKEEP_ADDED_WINDOW)
        #[arg(long)]
        window: Option<AddedWindow>,
    },

    /// Delete all products and sales
    Purge {
        /// Account to authenticate as (defaults to STOCKKEEP_ADMIN_USER)
        #[arg(long)]
        user: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print a bcrypt hash for STOCKKEEP_ADMIN_PASSWORD_HASH
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.json);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            output.error(&format!("{:#}", err));
            std::process::exit(2);
        }
    };
    stockkeep_observability::init(config.log_format);

    if let Err(err) = run(cli, &config, output).await {
        output.error(&format!("{:#}", err));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, config: &Config, output: Output) -> Result<()> {
    if let Commands::HashPassword = cli.command {
        return hash_new_password(output);
    }

    let db_path = config.resolve_db_path(cli.db)?;
    tracing::debug!(path = %db_path.display(), window = %config.added_window, "opening database");
    let store = SqliteInventoryStore::open(&db_path)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let service = InventoryService::new(Arc::new(store.clone()), config.authenticator())
        .with_added_window(config.added_window);

    let result = execute(cli.command, &service, config, output).await;
    store.close().await;
    result
}

async fn execute(
    command: Commands,
    service: &InventoryService,
    config: &Config,
    output: Output,
) -> Result<()> {
    match command {
        Commands::Add {
            name,
            quantity,
            price,
        } => {
            let cmd = input::register_product(&name, &quantity, &price, Utc::now())?;
            let product = service.add_product(cmd).await.context("failed to add product")?;
            output.product(&product);
        }
        Commands::Sell {
            product_id,
            quantity,
        } => {
            let cmd = input::sell_product(&product_id, &quantity, Utc::now())?;
            let receipt = service.sell(cmd).await.context("sale failed")?;
            output.receipt(&receipt);
        }
        Commands::List => {
            let products = service.list_products().await?;
            output.products(&products);
        }
        Commands::Sales { product_id } => {
            let id = input::product_id(&product_id)?;
            let sales = service.sales_for(id).await?;
            output.sales(&sales);
        }
        Commands::Search { query } => {
            let products = service.search(&query).await?;
            output.products(&products);
        }
        Commands::Report {
            day,
            month,
            year,
            window,
        } => {
            let date = input::report_date(&day, &month, &year)?;
            let window = window.unwrap_or(service.added_window());
            let report = service.report_for(date, window).await?;
            output.report(&report);
        }
        Commands::Purge { user, yes } => {
            let username = user.unwrap_or_else(|| config.admin_user.clone());

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Delete ALL products and sales? This cannot be undone")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    output.message("Purge cancelled");
                    return Ok(());
                }
            }

            let password = Password::new()
                .with_prompt(format!("Password for {}", username))
                .interact()?;
            let summary = service
                .purge(&Credentials::new(username, password))
                .await
                .context("purge refused")?;
            output.purged(&summary);
        }
        Commands::HashPassword => bail!("hash-password does not use the database"),
    }

    Ok(())
}

fn hash_new_password(output: Output) -> Result<()> {
    let password = Password::new()
        .with_prompt("New admin password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    if password.is_empty() {
        bail!("password cannot be empty");
    }
    let hash = hash_password(&password, DEFAULT_HASH_COST)?;
    output.message(&hash);
    Ok(())
}
