//! GateCheck CLI - Main Entry Point
//!
//! Runs browser-driven acceptance scenarios against a live web application.
//! Run with: gatecheck run --base-url http://127.0.0.1:3000

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gatecheck_harness::{
    BrowserKind, DriverConfig, DriverHandle, HarnessConfig, RunnerConfig, Scenario, SuiteRunner,
};

mod output;

use output::OutputFormat;

/// GateCheck - browser-driven acceptance suite for auth and role-based UI flows
#[derive(Parser)]
#[command(name = "gatecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to scenario specs directory
    #[arg(long, default_value = "specs", global = true)]
    specs: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against the application under test
    Run(RunArgs),

    /// List discovered scenarios
    List,

    /// Check that every scenario parses and is well-formed
    Validate,
}

#[derive(Args)]
struct RunArgs {
    /// Base URL of the application under test
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "GATECHECK_BASE_URL")]
    base_url: String,

    /// Existing WebDriver endpoint; when unset a driver process is spawned
    #[arg(long, env = "GATECHECK_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Path to the WebDriver binary to spawn
    #[arg(long, default_value = "chromedriver")]
    driver_binary: PathBuf,

    /// Browser to drive (chrome, firefox)
    #[arg(long, default_value = "chrome")]
    browser: String,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Maximum scenarios running concurrently
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Seed label for generated identities
    #[arg(long, default_value = "test")]
    seed: String,

    /// Output directory for results
    #[arg(short, long, default_value = "results")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(run(cli));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::List => {
            let scenarios = Scenario::load_all(&cli.specs)?;
            output::print_list(&scenarios, cli.format);
            Ok(true)
        }
        Commands::Validate => {
            let scenarios = Scenario::load_all(&cli.specs)?;
            for scenario in &scenarios {
                scenario
                    .validate()
                    .with_context(|| format!("scenario {}", scenario.name))?;
            }
            println!("{} scenario(s) OK", scenarios.len());
            Ok(true)
        }
        Commands::Run(args) => run_suite(cli.specs, cli.format, args).await,
    }
}

async fn run_suite(specs: PathBuf, format: OutputFormat, args: RunArgs) -> anyhow::Result<bool> {
    let browser = match args.browser.as_str() {
        "firefox" => BrowserKind::Firefox,
        _ => BrowserKind::Chrome,
    };

    // Spawn a driver unless an endpoint was provided; the handle stops the
    // process when dropped
    let (webdriver_url, _driver) = match args.webdriver_url {
        Some(url) => (url, None),
        None => {
            let driver = DriverHandle::spawn(DriverConfig {
                binary_path: args.driver_binary,
                ..Default::default()
            })
            .await?;
            (driver.endpoint().to_string(), Some(driver))
        }
    };

    let config = RunnerConfig {
        harness: HarnessConfig {
            base_url: args.base_url,
            webdriver_url,
            browser,
            headless: !args.headed,
            ..Default::default()
        },
        specs_dir: specs,
        output_dir: args.output,
        jobs: args.jobs.max(1),
        identity_seed: args.seed,
        ..Default::default()
    };

    let runner = SuiteRunner::new(config);

    let results = if let Some(name) = args.name {
        runner.run_named(&name).await?
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;
    output::print_suite(&results, format);

    Ok(results.all_passed())
}
