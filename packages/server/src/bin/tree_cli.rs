//! Operator CLI for the sponsor tree
//!
//! Outputs JSON lines so results can be piped into other tooling.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use downline_core::config::Config;
use downline_core::domains::member::actions::{audit_counts, seed_root, CountDrift, NewRoot};
use downline_core::kernel::ServerDeps;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "tree_cli")]
#[command(about = "Sponsor tree maintenance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,

    /// Create the root member of an empty tree
    SeedRoot {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        mobile: Option<String>,
    },

    /// Recompute side counts and report any drift
    Audit,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    member_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drift: Option<Vec<CountDrift>>,
}

fn output(resp: &Response) -> Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,downline_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let result = match cli.command {
        Commands::Migrate => cmd_migrate(&pool).await,
        Commands::SeedRoot {
            name,
            email,
            password,
            mobile,
        } => {
            let deps = ServerDeps::postgres(pool.clone(), config.credential_hash_cost);
            cmd_seed_root(
                NewRoot {
                    name,
                    email,
                    mobile,
                    password,
                },
                &deps,
            )
            .await
        }
        Commands::Audit => {
            let deps = ServerDeps::postgres(pool.clone(), config.credential_hash_cost);
            cmd_audit(&deps).await
        }
    };

    pool.close().await;
    result
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;

    output(&Response {
        success: true,
        message: Some("Migrations complete".to_string()),
        member_code: None,
        drift: None,
    })
}

async fn cmd_seed_root(root: NewRoot, deps: &ServerDeps) -> Result<()> {
    match seed_root(root, deps).await {
        Ok(code) => output(&Response {
            success: true,
            message: Some("Root member created".to_string()),
            member_code: Some(code.value()),
            drift: None,
        }),
        Err(e) => {
            output(&Response {
                success: false,
                message: Some(e.to_string()),
                member_code: None,
                drift: None,
            })?;
            std::process::exit(1);
        }
    }
}

async fn cmd_audit(deps: &ServerDeps) -> Result<()> {
    let drift = audit_counts(deps).await.context("Audit failed")?;
    let clean = drift.is_empty();

    output(&Response {
        success: clean,
        message: Some(format!("{} drifted counts", drift.len())),
        member_code: None,
        drift: Some(drift),
    })?;

    if !clean {
        std::process::exit(2);
    }
    Ok(())
}
