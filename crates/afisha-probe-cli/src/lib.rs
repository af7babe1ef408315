//! afisha-probe CLI library
//!
//! Command-line front end of the landing page suite: argument parsing,
//! console progress and suite execution against Chromium.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ListArgs, LocatorsArgs, RunArgs, SettleArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_locators, render_scenarios, ProgressReporter};
pub use runner::SuiteRunner;
