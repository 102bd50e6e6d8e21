use std::{io, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::AccountId;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;
use widget_core::{
    config::load_settings, http::HttpBackend, ChartAggregator, SearchController,
};

mod render;
mod watch;

use render::{render_chart, render_search};
use watch::run_watch;

#[derive(Parser, Debug)]
#[command(about = "Facility proximity search and PBJ contract hours chart")]
struct Args {
    /// Overrides the backend url from widgets.toml / environment.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for facilities near an account.
    Search {
        #[arg(long)]
        account: Option<String>,
        /// Raw radius input in miles; blank or non-numeric becomes 0.
        #[arg(long)]
        radius: Option<String>,
    },
    /// Fetch and draw quarterly contract hours for an account.
    Chart {
        #[arg(long)]
        account: String,
    },
    /// Read account ids from stdin and redraw the chart whenever one changes.
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings().context("failed to load widget settings")?;
    if let Some(url) = &args.backend_url {
        settings.set_backend_url(url)?;
    }
    let backend = Arc::new(HttpBackend::new(settings.backend_url()?));
    info!(backend_url = %backend.base_url(), "widgets backend configured");

    match args.command {
        Command::Search { account, radius } => {
            let account_id = account.as_deref().and_then(AccountId::parse_optional);
            let mut search = SearchController::new(backend, account_id)
                .with_radius(settings.default_radius_miles);
            if let Some(raw) = radius {
                search.set_radius(&raw);
            }
            if search.account_id().is_none() {
                println!("No account selected; nothing to search.");
                return Ok(());
            }
            search.trigger_search().await;
            println!("{}", render_search(search.state()));
        }
        Command::Chart { account } => {
            let mut chart = ChartAggregator::new(backend);
            chart.refresh(AccountId::parse_optional(&account)).await;
            println!("{}", render_chart(chart.state()));
        }
        Command::Watch => {
            let mut chart = ChartAggregator::new(backend);
            let mut stdout = io::stdout();
            run_watch(&mut chart, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
        }
    }

    Ok(())
}
