//! afisha-probe: UI verification of the Afisha city landing page
//!
//! ## Usage
//!
//! ```bash
//! afisha-probe run                         # Run every scenario
//! afisha-probe run --filter top_block      # Run matching scenarios
//! afisha-probe run --seed 42 --headed      # Reproduce a run in a window
//! afisha-probe list                        # Show the catalogue
//! afisha-probe locators eventCardRoot      # Show a selector
//! afisha-probe config -c probe.yaml        # Show the effective configuration
//! ```

use afisha_probe::scenarios::{main_page_suite, select};
use afisha_probe::{descriptors, ElementId, ProbeConfig};
use afisha_probe_cli::{
    render_locators, render_scenarios, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands,
    ConfigArgs, ListArgs, LocatorsArgs, ProgressReporter, RunArgs, SuiteRunner, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => run_suite(&config, &args),
        Commands::List(args) => {
            list_scenarios(&args);
            Ok(())
        }
        Commands::Locators(args) => show_locators(&args),
        Commands::Config(args) => show_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.color.should_color()).try_init()
    };
}

fn run_suite(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    // flags go on top of file and env; SuiteRunner::run validates the result
    let mut probe = ProbeConfig::load(args.config.as_deref())?;
    args.apply(&mut probe);

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let runner = SuiteRunner::new(probe, reporter);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(runner.run(args.filter.as_deref()))?;

    if report.failed_count() == 0 {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.failed_count(),
            total: report.total_count(),
        })
    }
}

fn list_scenarios(args: &ListArgs) {
    let scenarios = select(&main_page_suite(), args.filter.as_deref());
    print!("{}", render_scenarios(&scenarios));
}

fn show_locators(args: &LocatorsArgs) -> CliResult<()> {
    match args.name.as_deref() {
        None => print!("{}", render_locators(&descriptors())),
        Some(name) => {
            let id = ElementId::from_name(name)
                .ok_or_else(|| CliError::invalid_argument(format!("unknown locator '{name}'")))?;
            println!("{}", id.selector().to_css());
        }
    }
    Ok(())
}

fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = ProbeConfig::load(args.config.as_deref())?;
    config.validate()?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
