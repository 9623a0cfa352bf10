//! Branch Ledger - weekly report tool
//!
//! Prints the weekly production report for one branch and department as JSON.
//!
//! Usage: `ledger-report <date> <branch> <department> [group]`

use anyhow::bail;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use branch_ledger_backend::{AppState, Config};
use shared::parse_iso_date;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ledger_report=debug,branch_ledger_backend=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        bail!("usage: ledger-report <date> <branch> <department> [group]");
    }

    let anchor = parse_iso_date(&args[0])?;
    let branch = &args[1];
    let department = &args[2];
    let group = args.get(3).map(String::as_str);

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Environment: {}", config.environment);

    let state = AppState::connect(config).await?;
    let report = state
        .reporting
        .weekly_production(anchor, branch, department, group)
        .await;

    for date in report.failed_days() {
        tracing::warn!(%date, "Day left out of the weekly totals");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
