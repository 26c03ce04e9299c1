mod availability;
mod config;
mod console;
mod store;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};

use crate::availability::editor::LoadOutcome;
use crate::availability::step::{AvailabilityStep, Mounted, Navigation, RecordedNavigation};
use crate::availability::week::AnchorPolicy;
use crate::config::load_step_settings;
use crate::store::{StoreKind, UserId, select_store};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStoreKind {
    Auto,
    Memory,
    File,
}

impl From<CliStoreKind> for StoreKind {
    fn from(value: CliStoreKind) -> Self {
        match value {
            CliStoreKind::Auto => StoreKind::Auto,
            CliStoreKind::Memory => StoreKind::Memory,
            CliStoreKind::File => StoreKind::File,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliAnchorPolicy {
    OnOrAfter,
    StrictlyAfter,
}

impl From<CliAnchorPolicy> for AnchorPolicy {
    fn from(value: CliAnchorPolicy) -> Self {
        match value {
            CliAnchorPolicy::OnOrAfter => AnchorPolicy::OnOrAfter,
            CliAnchorPolicy::StrictlyAfter => AnchorPolicy::StrictlyAfter,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "availability",
    version,
    about = "Weekly availability grid editor with local persistence"
)]
struct Cli {
    /// User whose availability is edited; without one the step sends you back.
    #[arg(long, visible_alias = "uid")]
    user: Option<String>,

    #[arg(long, default_value = "availability-store.json")]
    store: PathBuf,

    #[arg(long, value_enum, default_value_t = CliStoreKind::Auto)]
    store_kind: CliStoreKind,

    /// Optional JSON settings file (default window, anchor policy).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference date for the week anchor, YYYY-MM-DD. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,

    #[arg(long, value_enum)]
    anchor_policy: Option<CliAnchorPolicy>,

    /// Read commands from stdin instead of opening a window.
    #[arg(long)]
    headless: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run() {
        tracing::error!("availability exited with error: {err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_step_settings(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Default::default(),
    };
    if let Some(policy) = cli.anchor_policy {
        settings.anchor_policy = policy.into();
    }

    let selected = select_store(cli.store_kind.into(), cli.store.clone())
        .with_context(|| format!("failed to open store {}", cli.store.display()))?;
    tracing::info!(store = selected.label, "store selected");

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let mut navigator = RecordedNavigation::default();
    let (mounted, outcome) = AvailabilityStep::mount(
        UserId::parse(cli.user.as_deref()),
        selected.store,
        today,
        settings,
        &mut navigator,
    )?;

    let mut step = match mounted {
        Mounted::Ready(step) => *step,
        Mounted::Retreated => {
            println!("No user id given; returning to the previous step.");
            return Ok(());
        }
    };

    let mut notices = Vec::new();
    if let Some(reason) = selected.fallback_reason {
        notices.push(format!("Fallback: {reason}"));
    }
    if let Some(LoadOutcome::Recovered(err)) = outcome {
        notices.push(format!(
            "Stored availability was unreadable ({err}); starting from an empty grid."
        ));
    }

    let navigation = if cli.headless {
        for notice in &notices {
            println!("{notice}");
        }
        let stdin = io::stdin();
        console::run_console(&mut step, stdin.lock(), &mut io::stdout().lock())?
    } else {
        let notice = (!notices.is_empty()).then(|| notices.join(" "));
        ui::app::run_gui(step, selected.label, notice)?
    };

    match navigation {
        Some(Navigation::Advance) => tracing::info!("advancing to the next step"),
        Some(Navigation::Retreat) => tracing::info!("returning to the previous step"),
        None => tracing::info!("availability step closed"),
    }
    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{input}', expected YYYY-MM-DD"))
}
