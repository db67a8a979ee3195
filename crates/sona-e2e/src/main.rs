//! # sona-e2e
//!
//! Conformance test harness for the Sona API.
//!
//! This binary runs ordered scenario suites against a live deployment:
//! - User lifecycle, authentication, and permission enforcement
//! - Incident lifecycle, attachments, and filtered querying
//! - Outbound webhook notifications (via a collector double)
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite
//! sona-e2e all
//!
//! # Run one suite
//! sona-e2e users
//!
//! # List scenarios without running them
//! sona-e2e --list
//! ```

use clap::{Parser, ValueEnum};
use colored::Colorize;
use sona_e2e::{
    HarnessConfig, RunConfig, SuiteContext, TerminalReporter, TestRunner, Verbosity,
    create_progress_callback, scenarios,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Suite selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Suite {
    /// Run every suite in dependency order
    #[default]
    All,
    /// User lifecycle and permission enforcement
    Users,
    /// Incident lifecycle, attachments, and filtering
    Incidents,
    /// Outbound webhook notifications
    Webhooks,
}

/// Conformance harness for the Sona API.
///
/// Validates authentication, authorization tiers, resource lifecycles, and
/// webhook notifications of a live deployment from the outside.
#[derive(Parser, Debug)]
#[command(name = "sona-e2e")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Suite to run
    #[arg(value_enum, default_value_t = Suite::All)]
    suite: Suite,

    /// Show detailed output during the run
    #[arg(short, long)]
    verbose: bool,

    /// Only show the final summary
    #[arg(short, long)]
    quiet: bool,

    /// List registered scenarios without running them
    #[arg(long)]
    list: bool,

    /// Run only scenarios whose name contains this pattern
    #[arg(long)]
    filter: Option<String>,

    /// Base URL of the service under test
    #[arg(long, env = "SONA_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Base URL of the webhook collector double
    #[arg(long, env = "SONA_COLLECTOR_URL", default_value = "http://localhost:5000")]
    collector_url: String,

    /// Email of the seeded administrator account
    #[arg(
        long,
        env = "SONA_ADMIN_EMAIL",
        default_value = "something@somewhere.com"
    )]
    admin_email: String,

    /// Password of the seeded administrator account
    #[arg(long, env = "SONA_ADMIN_PASSWORD", default_value = "itsasecret")]
    admin_password: String,

    /// Recipient address the deployment's hook templates notify
    #[arg(long, env = "SONA_NOTIFY_TO", default_value = "foobar@email.com")]
    notify_to: String,

    /// How long to keep polling the collector for a notification, in seconds
    #[arg(long, env = "SONA_WEBHOOK_TIMEOUT_SECS", default_value_t = 10)]
    webhook_timeout_secs: u64,
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            collector_url: self.collector_url.clone(),
            admin_email: self.admin_email.clone(),
            admin_password: self.admin_password.clone(),
            notify_to: self.notify_to.clone(),
            webhook_timeout: Duration::from_secs(self.webhook_timeout_secs),
            ..HarnessConfig::default()
        }
    }
}

/// Registers the selected suites with the runner, in dependency order.
fn register_suites(runner: &mut TestRunner, suite: Suite) {
    match suite {
        Suite::All => {
            scenarios::users::register(runner);
            scenarios::incidents::register(runner);
            scenarios::webhooks::register(runner);
        }
        Suite::Users => scenarios::users::register(runner),
        Suite::Incidents => scenarios::incidents::register(runner),
        Suite::Webhooks => scenarios::webhooks::register(runner),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    println!(
        "\n{} {}",
        "Sona conformance harness".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", "━".repeat(40).dimmed());

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let mut runner = TestRunner::new();
    register_suites(&mut runner, cli.suite);

    if cli.list {
        list_scenarios(&runner);
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_scenarios(&cli, runner, verbosity))
}

fn list_scenarios(runner: &TestRunner) {
    println!("{}\n", "Registered scenarios:".bold());
    for name in runner.case_names() {
        println!("  {name}");
    }
    println!(
        "\n  {}",
        format!(
            "Total: {} scenario{}",
            runner.case_count(),
            if runner.case_count() == 1 { "" } else { "s" }
        )
        .dimmed()
    );
}

async fn run_scenarios(cli: &Cli, runner: TestRunner, verbosity: Verbosity) -> anyhow::Result<()> {
    let config = cli.harness_config();
    if verbosity != Verbosity::Quiet {
        println!("{}", format!("Target: {}", config.base_url).dimmed());
        println!();
    }

    let mut ctx = SuiteContext::new(config);
    let runner = runner.on_progress(create_progress_callback(verbosity));

    let mut run_config = RunConfig::new();
    if let Some(filter) = &cli.filter {
        run_config = run_config.with_filter(filter);
    }

    let results = runner.execute(&mut ctx, &run_config).await?;

    let reporter = TerminalReporter::with_verbosity(verbosity);
    if verbosity == Verbosity::Quiet && !results.all_passed() {
        reporter.print_failures(&results);
    }
    reporter.print_summary(&results);

    // Non-zero exit iff any scenario failed, after the full summary.
    if let Err(e) = results.ensure_all_passed() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
