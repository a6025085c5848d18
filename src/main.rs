mod browser;
mod cli;
mod config;
mod diagnostics;
mod discovery;
mod error;
mod form;
mod ledger;
mod orchestrator;
mod profile;
mod selectors;
mod session;
mod state_machine;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use browser::WebDriverPage;
use cli::{Cli, Command};
use config::AutoApplyConfig;
use ledger::Ledger;
use orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AutoApplyConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            keywords,
            max_pages,
            headless,
        } => {
            if !keywords.is_empty() {
                config.search.keywords = keywords;
            }
            if let Some(max_pages) = max_pages {
                config.search.max_pages = max_pages;
            }
            config.headless |= headless;
            run(&config).await?;
        }
        Command::Status => {
            let ledger = Ledger::new(&config.ledger_path);
            println!("ledger: {}", ledger.path().display());
            ui::print_status(&ledger.entries());
        }
        Command::Check { id } => {
            let ledger = Ledger::new(&config.ledger_path);
            match ledger.get(&id) {
                Some(entry) => println!(
                    "{id}: {} ({} @ {}, {})",
                    entry.outcome,
                    entry.title,
                    entry.organization,
                    entry.recorded_at.to_rfc3339()
                ),
                None if ledger.has(&id) => println!("{id}: in ledger (row not readable)"),
                None => println!("{id}: not in ledger"),
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "autoapply=debug"
    } else {
        "autoapply=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: &AutoApplyConfig) -> Result<()> {
    let missing = config.profile.missing_fields();
    if !missing.is_empty() {
        warn!(?missing, "profile is incomplete, those fields get generic answers");
    }

    let page = WebDriverPage::connect(&config.webdriver_url, config.headless)
        .await
        .with_context(|| format!("connecting to WebDriver at {}", config.webdriver_url))?;
    let run_id = Uuid::new_v4();
    info!(%run_id, session = page.session_id(), "browser session ready");

    let outcome = async {
        if config.skip_login {
            info!("skipping login");
        } else {
            session::login(&page, &config.base_url()?, &config.credentials, &config.timing)
                .await
                .context("logging in")?;
        }
        let summary = Orchestrator::new(&page, config, run_id)?.run().await;
        ui::print_summary(&summary);
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = page.quit().await {
        warn!(error = %e, "could not close browser session");
    }
    outcome
}
