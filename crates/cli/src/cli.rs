use clap::{Args, Parser, Subcommand};

use stockroom_infra::DeletionPolicy;
use stockroom_observability::LogFormat;

#[derive(Parser)]
#[command(name = "stockroom", about = "Warehouse inventory ledger", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Overrides DATABASE_URL.
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Overrides LOCATION_DELETION_POLICY.
    #[arg(long, global = true)]
    pub deletion_policy: Option<DeletionPolicy>,

    #[arg(long, global = true, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the schema if it does not exist
    Migrate,
    /// Manage products
    #[command(subcommand)]
    Product(ProductCommand),
    /// Manage locations
    #[command(subcommand)]
    Location(LocationCommand),
    /// Record a movement between locations (omit an end for "unallocated")
    Move(MoveArgs),
    /// Show unallocated and total quantity per product
    Levels,
    /// Show net quantity per product and location
    Summary(SummaryArgs),
    /// Show the movement ledger with names resolved
    History,
    /// Recompute unallocated quantities from the ledger and report drift
    Check,
}

#[derive(Subcommand)]
pub enum ProductCommand {
    /// Create a product; all of its stock starts unallocated
    Add { name: String, total_quantity: i64 },
    /// Rename a product
    Rename { id: i64, name: String },
    /// Change a product's total quantity
    SetTotal { id: i64, total_quantity: i64 },
    /// Delete a product; its ledger entries stay as history
    Delete { id: i64 },
    /// List products
    List,
}

#[derive(Subcommand)]
pub enum LocationCommand {
    /// Create a location
    Add { name: String },
    /// Rename a location
    Rename { id: i64, name: String },
    /// Delete a location and return its stock to unallocated
    Delete { id: i64 },
    /// List locations
    List,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Product name
    pub product: String,
    pub quantity: i64,
    /// Source location name
    #[arg(long)]
    pub from: Option<String>,
    /// Destination location name
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Product ids to include (default: every product)
    #[arg(long = "product")]
    pub products: Vec<i64>,
    /// Location ids to include (default: every location)
    #[arg(long = "location")]
    pub locations: Vec<i64>,
}
