use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use folio_server::auth::accounts::reset_admin;
use folio_server::config::{self, Config};
use folio_server::db;
use folio_server::seed::seed_all;
use sqlx::SqlitePool;

const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI - Seed content and manage the portfolio API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the admin account, profile, sample skills and sample projects
    Seed,
    /// Delete and recreate the admin account from the environment
    ResetAdmin,
    /// Check that a running server answers its health endpoint
    Status {
        /// Base URL of the API server
        #[arg(long, default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    success: bool,
    message: String,
    timestamp: String,
    environment: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed => {
            let config = config::loader::load()?;
            let pool = open_pool(&config).await?;
            seed(&config, &pool).await?
        }
        Commands::ResetAdmin => {
            let config = config::loader::load()?;
            let pool = open_pool(&config).await?;
            reset(&config, &pool).await?
        }
        Commands::Status { api_url } => status(&api_url).await?,
    }

    Ok(())
}

async fn open_pool(config: &Config) -> Result<SqlitePool> {
    let (pool, _) = db::init_pool(&config.database.path).await?;
    Ok(pool)
}

async fn seed(config: &Config, pool: &SqlitePool) -> Result<()> {
    let admin = config.admin.resolve_credentials();
    let report = seed_all(pool, admin.as_ref()).await?;

    println!("✓ Seeding finished");
    println!("  Admin:    {}", report.admin);
    println!("  Profile:  {}", report.about);
    println!("  Skills:   {}", report.skills);
    println!("  Projects: {}", report.projects);
    if let Some(admin) = admin {
        println!("  Login:    {}", admin.email);
    }

    Ok(())
}

async fn reset(config: &Config, pool: &SqlitePool) -> Result<()> {
    let admin = config.admin.resolve_credentials().with_context(|| {
        format!(
            "{} and {} must be set",
            config.admin.email_env, config.admin.password_env
        )
    })?;
    let user = reset_admin(pool, &admin).await?;

    println!("✓ Admin account reset");
    println!("  ID:    {}", user.id);
    println!("  Email: {}", user.email);

    Ok(())
}

async fn status(api_url: &str) -> Result<()> {
    let url = format!("{}/api/health", api_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "Health check failed with status: {}",
            response.status()
        ));
    }

    let health: HealthResponse = response
        .json()
        .await
        .context("Failed to parse health response")?;
    if !health.success {
        return Err(anyhow::anyhow!("Server reported: {}", health.message));
    }

    println!("✓ {}", health.message);
    println!("  Environment: {}", health.environment);
    println!("  Timestamp:   {}", health.timestamp);

    Ok(())
}
