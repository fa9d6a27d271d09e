//! # CLI
//!
//! clap command definitions and the `cmd_*` implementations behind them.
//!
//! Every command except `serve` opens the database, does one operation and
//! exits. Human-readable output goes to stdout; `--json` switches to the same
//! payloads the HTTP API returns.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use vip_core::{TierTable, VipStore};

use crate::api::{self, AddPointsResponse, MAX_TIER_SENTINEL, StatusResponse};
use crate::config::{DEFAULT_DB_PATH, DEFAULT_HOST, DEFAULT_PORT, ServerConfig};

pub type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Parser)]
#[command(name = "vip", version, about = "VIP tier server and CLI")]
pub struct Cli {
    /// Path to the redb database file.
    #[arg(long, global = true, env = "VIP_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve {
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: String,

        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Require this bearer token on /vip/* routes.
        #[arg(long, env = "VIP_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Global requests per second (0 = unlimited).
        #[arg(long, env = "VIP_RATE_LIMIT", default_value_t = 0)]
        rate_limit: u32,
    },

    /// Create a new database with the default tier table.
    Init {
        /// Overwrite an existing database.
        #[arg(long)]
        force: bool,
    },

    /// Show the tier table.
    Levels {
        #[arg(long)]
        json: bool,

        /// Rewrite the stored table to the default tiers.
        #[arg(long)]
        reset: bool,
    },

    /// Show a user's tier, creating the user on first reference.
    Status {
        user_id: String,

        #[arg(long)]
        json: bool,
    },

    /// Award points to an existing user.
    Award {
        user_id: String,

        points: u64,

        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> CliResult {
    match cli.command {
        Commands::Serve {
            host,
            port,
            api_key,
            rate_limit,
        } => {
            let config = ServerConfig {
                host,
                port,
                db_path: cli.db,
                api_key,
                rate_limit,
            };
            api::serve(config).await
        }
        Commands::Init { force } => cmd_init(&cli.db, force),
        Commands::Levels { json, reset } => cmd_levels(&cli.db, json, reset),
        Commands::Status { user_id, json } => cmd_status(&cli.db, &user_id, json),
        Commands::Award {
            user_id,
            points,
            json,
        } => cmd_award(&cli.db, &user_id, points, json),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

pub fn cmd_init(db_path: &Path, force: bool) -> CliResult {
    if db_path.exists() {
        if !force {
            return Err(format!(
                "Database already exists at {}. Use --force to overwrite.",
                db_path.display()
            )
            .into());
        }
        std::fs::remove_file(db_path)?;
        info!(path = %db_path.display(), "Removed existing database");
    }

    let store = VipStore::open(db_path)?;
    println!(
        "Initialized VIP database at {} with {} tiers",
        store.path().display(),
        store.tiers()?.len()
    );
    Ok(())
}

pub fn cmd_levels(db_path: &Path, json: bool, reset: bool) -> CliResult {
    let store = VipStore::open(db_path)?;
    if reset {
        store.replace_tiers(&TierTable::default())?;
        info!("Tier table reset to defaults");
    }

    let tiers = store.tiers()?;
    if json {
        println!("{}", serde_json::to_string_pretty(tiers.as_slice())?);
    } else {
        println!("{:<6} {:<12} {:>12}", "LEVEL", "NAME", "MIN POINTS");
        for tier in &tiers {
            println!("{:<6} {:<12} {:>12}", tier.level, tier.name, tier.min_points);
        }
    }
    Ok(())
}

pub fn cmd_status(db_path: &Path, user_id: &str, json: bool) -> CliResult {
    let store = VipStore::open(db_path)?;
    let (user, created) = store.get_or_create_user(user_id)?;
    if created {
        info!(user_id, "created VIP user");
    }

    let resolved = store.tiers()?.resolve(user.points);
    let at_top = resolved.is_max();
    let status = StatusResponse::new(user_id, resolved);
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("User:    {}", status.user_id);
        println!("Tier:    {} (level {})", status.vip_level, status.vip_level_number);
        println!("Points:  {}", status.points);
        if at_top {
            println!("Next:    {MAX_TIER_SENTINEL}");
        } else {
            println!("Next:    {} in {} points", status.next_level, status.points_to_next);
        }
    }
    Ok(())
}

pub fn cmd_award(db_path: &Path, user_id: &str, points: u64, json: bool) -> CliResult {
    let store = VipStore::open(db_path)?;
    let result = store.award_points(user_id, points)?;

    if json {
        let response = AddPointsResponse::from(result);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if result.upgraded {
        println!(
            "{} upgraded: level {} -> {} ({}), {} points",
            result.user_id, result.old_level, result.new_level, result.new_level_name, result.new_points
        );
    } else {
        println!(
            "{} stays at {} (level {}), {} points",
            result.user_id, result.new_level_name, result.new_level, result.new_points
        );
    }
    Ok(())
}
