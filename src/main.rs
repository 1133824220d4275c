//! Hilan Attendance - fills missing attendance days on the Hilan portal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use hilan_attendance as app;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use app::config::{AppConfig, ConfigLoadResult};
use app::display;
use app::error::AppError;
use app::flow::{self, AttendanceFlow, FillOptions, FillReport, StatusSummary};
use app::portal::ChromeBrowser;
use app::setup::SetupWizard;
use app::vocabulary::parse_month;

/// Smart tool to automatically fill your attendance hours on Hilan.
///
/// Quick start: run 'hilan init' to create your config, 'hilan status' to
/// view current attendance, then 'hilan fill' to fill missing days.
#[derive(Parser)]
#[command(name = "hilan", version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the configuration interactively
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
    /// Fill attendance for a pay period
    Fill {
        #[command(flatten)]
        period: PeriodArgs,
        /// Preview without submitting
        #[arg(short, long)]
        dry_run: bool,
        /// Only fill today (if needed)
        #[arg(short, long, conflicts_with = "up_to_today")]
        today: bool,
        /// Fill all days up to and including today
        #[arg(short, long)]
        up_to_today: bool,
    },
    /// View current attendance status
    Status {
        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[derive(clap::Args)]
struct PeriodArgs {
    /// Month (1-12 or name). Default: current pay period
    #[arg(short, long, value_parser = parse_month)]
    month: Option<u32>,
    /// Year. Default: current pay period
    #[arg(short, long)]
    year: Option<i32>,
}

impl PeriodArgs {
    /// The current pay period unless a month or year was given.
    fn resolve(&self, config: &AppConfig, today: NaiveDate) -> (i32, u32) {
        if self.month.is_none() && self.year.is_none() {
            config.current_pay_period(today)
        } else {
            (self.year.unwrap_or(today.year()), self.month.unwrap_or(today.month()))
        }
    }
}

fn init_logging(verbose: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hilan={level},hilan_attendance={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(verbose)
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose);
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let today = Local::now().date_naive();

    match cli.command {
        Command::Init { force } => init(&config_path, force),
        Command::Fill {
            period,
            dry_run,
            today: today_only,
            up_to_today,
        } => {
            let config = load_config(&config_path)?;
            let (year, month) = period.resolve(&config, today);
            let options = FillOptions {
                dry_run,
                today_only,
                up_to_today,
            };
            run_blocking(move || fill(&config, year, month, options, today)).await
        }
        Command::Status { period } => {
            let config = load_config(&config_path)?;
            let (year, month) = period.resolve(&config, today);
            run_blocking(move || status(&config, year, month)).await
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    info!("Config path: {}", path.display());
    AppConfig::load(path).with_context(|| format!("Could not load config from {}", path.display()))
}

/// Run a browser session off the async runtime.
async fn run_blocking<F>(task: F) -> anyhow::Result<()>
where
    F: FnOnce() -> app::Result<()> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Task(e.to_string()))?;
    match result {
        Err(e) if !e.is_fatal() => {
            warn!("{e}");
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            Err(e.into())
        }
        Ok(()) => Ok(()),
    }
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    match AppConfig::try_load(path) {
        ConfigLoadResult::Missing => {}
        _ if force => info!("Overwriting configuration at {}", path.display()),
        ConfigLoadResult::Loaded(_) => {
            warn!("Configuration already exists at {}", path.display());
            info!("Use --force to overwrite.");
            return Ok(());
        }
        ConfigLoadResult::Invalid(e) => {
            warn!("Existing configuration is invalid ({e}), use --force to replace it");
            return Ok(());
        }
    }

    let config = SetupWizard::new(io::stdin().lock(), io::stdout()).run()?;
    config.save(path)?;
    println!("\nSetup complete!\nConfig: {}\n\nRun 'hilan status' to view attendance.", path.display());
    Ok(())
}

fn prompt_line(question: &str) -> io::Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_lowercase())
}

fn confirm_fill(days: usize) -> bool {
    match prompt_line(&format!("\nFill {days} days? [y/N] ")) {
        Ok(answer) => matches!(answer.as_str(), "y" | "yes"),
        Err(e) => {
            warn!("Could not read confirmation: {e}");
            false
        }
    }
}

/// Keep a visible browser open until the user is done looking at it.
fn wait_for_close(config: &AppConfig) -> app::Result<()> {
    if !config.browser.headless {
        prompt_line("\nPress Enter to close browser...")?;
    }
    Ok(())
}

fn fill(config: &AppConfig, year: i32, month: u32, options: FillOptions, today: NaiveDate) -> app::Result<()> {
    info!("Filling attendance for {month}/{year}...");
    let browser = ChromeBrowser::launch(&config.browser)?;
    let mut portal = AttendanceFlow::new(browser, config);
    let attendance = portal.fetch(year, month)?;

    let plan = flow::fill_plan(&attendance, portal.pattern(), options, today);
    if plan.iter().any(|entry| !entry.action.is_skip()) {
        display::print_plan(&plan, portal.pattern());
    }

    match portal.fill(&attendance, options, today, confirm_fill) {
        FillReport::Completed(summary) => display::print_run_summary(&summary),
        FillReport::NothingToFill(_) | FillReport::Cancelled => {}
    }
    wait_for_close(config)
}

fn status(config: &AppConfig, year: i32, month: u32) -> app::Result<()> {
    info!("Checking attendance for {month}/{year}...");
    let browser = ChromeBrowser::launch(&config.browser)?;
    let mut portal = AttendanceFlow::new(browser, config);
    let attendance = portal.fetch(year, month)?;

    display::print_status(&attendance, portal.pattern());
    display::print_status_summary(&StatusSummary::of(&attendance, portal.pattern()));
    wait_for_close(config)
}
