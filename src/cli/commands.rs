use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "return-policy")]
#[command(about = "Return eligibility and refund lead times for the store's return & refund policy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether an item can be returned
    Evaluate {
        /// Item category (e.g. fashion, "Health & Beauty", electronics)
        category: String,

        /// Subcategory (e.g. swimwear, earrings, made-to-order)
        #[arg(short, long)]
        subcategory: Option<String>,

        /// Return reason. Repeat for an ambiguous return; the most permissive wins
        #[arg(short, long = "reason", required = true)]
        reasons: Vec<String>,

        /// Delivery date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days_ago")]
        delivered: Option<NaiveDate>,

        /// Days since delivery, instead of --delivered
        #[arg(long)]
        days_ago: Option<u32>,

        /// Evaluate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Original seal is broken
        #[arg(long)]
        opened: bool,

        /// Item has been used
        #[arg(long)]
        used: bool,

        /// Accessories or freebies are missing
        #[arg(long)]
        missing_accessories: bool,

        /// Tags or labels were removed
        #[arg(long)]
        no_tags: bool,

        /// Hygienic strip was removed
        #[arg(long)]
        hygienic_strip_removed: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show how a refund will be paid out
    Refund {
        /// Original payment method (credit-card, debit-card, cod, bank-transfer, e-wallet, the-1-point)
        payment: String,

        /// Refund trigger (return-accepted, order-cancelled)
        #[arg(short, long, default_value = "return-accepted")]
        event: String,

        /// The 1 Points used as a discount on the order
        #[arg(short, long)]
        points: Option<u64>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show the rule catalog
    Catalog {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Validate a catalog file without loading it into the configuration
    ValidateCatalog {
        /// Path to a TOML catalog
        path: String,
    },

    /// Read the policy document
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },

    /// Show recorded evaluations
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Show refund plans instead of evaluations
        #[arg(long)]
        refunds: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show statistics for recorded decisions
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Print the whole policy
    Show,

    /// List section headings
    Sections {
        /// Deepest heading level to include
        #[arg(short, long, default_value = "6")]
        levels: usize,
    },

    /// Print one section by title or anchor
    Section {
        title_or_anchor: String,
    },

    /// Keyword search with snippets
    Search {
        query: String,

        #[arg(short, long, default_value = "8")]
        max_results: usize,

        /// Characters of context on each side of a match
        #[arg(long, default_value = "120")]
        context: usize,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}
