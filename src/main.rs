//! # Lot Catalog CLI (`lot`)
//!
//! The `lot` binary loads the dealer's vehicle rows, materializes the
//! cached snapshots, answers catalog queries, and serves the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! lot --config ./config/lot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lot init` | Create the Record Source table |
//! | `lot import <file.json>` | Upsert vendor rows keyed by VIN |
//! | `lot materialize` | Rebuild the full and lite snapshots |
//! | `lot list` | Run a list query and print JSON |
//! | `lot get <key>` | Show one vehicle by stock number or VIN |
//! | `lot facets` | Print the snapshot's facet histogram |
//! | `lot audit` | Report raw values no normalization rule matched |
//! | `lot serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! lot init
//! lot import ./feed/vehicles.json --prune
//! lot materialize
//! lot list --model f150 --filter color=Agate\ Black --sort price_asc
//! lot serve
//! ```

use clap::{Parser, Subcommand};
use lot_catalog::query::{parse_params, InventoryRequest, QueryService};
use lot_catalog::sqlite_source::SqliteRecordSource;
use lot_catalog::{audit, config, get, import, materialize, migrate, server, stats};
use lot_catalog_core::source::RecordSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lot Catalog: a dealer vehicle inventory catalog with faceted filtering.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lot",
    about = "Lot Catalog: dealer vehicle inventory with cached snapshots and faceted search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the Record Source table. Safe to run repeatedly.
    Init,

    /// Upsert vehicle rows from a JSON array of column/value objects.
    Import {
        /// Path to the JSON file.
        file: PathBuf,

        /// Delete stored vehicles whose VIN is not in the file.
        #[arg(long)]
        prune: bool,
    },

    /// Rebuild the full and lite snapshot files.
    ///
    /// Does nothing when the snapshots already reflect the Record Source.
    Materialize {
        /// Rebuild even when the snapshots are current.
        #[arg(long)]
        force: bool,
    },

    /// Run a list query and print the JSON response.
    List {
        /// Model family slug (e.g. `f150`, `bronco`).
        #[arg(long)]
        model: Option<String>,

        /// Include a value: `dimension=value`. Repeatable.
        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,

        /// Exclude a value: `dimension=value`. Repeatable.
        #[arg(long = "exclude", value_parser = parse_key_val)]
        excludes: Vec<(String, String)>,

        /// `stock`, `random`, `price_asc`, `price_desc`, or `trim_asc`.
        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        page: Option<usize>,

        #[arg(long)]
        per_page: Option<usize>,

        /// Emit lite vehicle projections.
        #[arg(long)]
        lite: bool,

        /// Include facet counts.
        #[arg(long)]
        facets: bool,
    },

    /// Show one vehicle by stock number or VIN.
    Get {
        key: String,
    },

    /// Print the snapshot's global facet histogram.
    Facets,

    /// Report raw attribute values that pass through normalization unchanged.
    Audit,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

/// Parse a `key=value` pair for `--filter` and `--exclude`.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid DIMENSION=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Record source initialized successfully.");
        }
        Commands::Import { file, prune } => {
            import::run_import(&cfg, &file, prune).await?;
        }
        Commands::Materialize { force } => {
            let source = SqliteRecordSource::new(&cfg);
            materialize::run_materialize(&cfg, &source, force).await?;
        }
        Commands::List {
            model,
            filters,
            excludes,
            sort,
            page,
            per_page,
            lite,
            facets,
        } => {
            let mut params: Vec<(String, String)> = Vec::new();
            if let Some(m) = model {
                params.push(("model".to_string(), m));
            }
            params.extend(filters);
            params.extend(
                excludes
                    .into_iter()
                    .map(|(dim, value)| (format!("exclude_{}", dim), value)),
            );
            if let Some(s) = sort {
                params.push(("sort".to_string(), s));
            }
            if let Some(p) = page {
                params.push(("page".to_string(), p.to_string()));
            }
            if let Some(p) = per_page {
                params.push(("per_page".to_string(), p.to_string()));
            }
            if lite {
                params.push(("lite".to_string(), "1".to_string()));
            }
            if facets {
                params.push(("facets".to_string(), "1".to_string()));
            }

            let request = parse_params(&params, cfg.query.default_per_page, cfg.query.max_per_page)
                .map_err(anyhow::Error::msg)?;
            let config = Arc::new(cfg);
            let source: Arc<dyn RecordSource> = Arc::new(SqliteRecordSource::new(&config));
            let service = QueryService::new(config, source)?;
            let response = match request {
                InventoryRequest::List(req) => service.list(&req).await,
                InventoryRequest::Single(key) => service.list_one(&key).await,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Get { key } => {
            get::run_get(&cfg, &key).await?;
        }
        Commands::Facets => {
            stats::run_facets(&cfg).await?;
        }
        Commands::Audit => {
            audit::run_audit(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
