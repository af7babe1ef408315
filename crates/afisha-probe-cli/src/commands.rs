//! CLI command definitions using clap

use afisha_probe::{ProbeConfig, SettleMode};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// afisha-probe: UI verification of the Afisha city landing page
#[derive(Parser, Debug)]
#[command(name = "afisha-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the landing page scenarios in a browser
    Run(RunArgs),

    /// List the scenario catalogue
    List(ListArgs),

    /// Show registry locators
    Locators(LocatorsArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Seed for random feed and card selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Scenarios run at once
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Retries of a failing scenario
    #[arg(long)]
    pub retries: Option<u32>,

    /// Site origin
    #[arg(long)]
    pub base_url: Option<String>,

    /// City slug of the landing page
    #[arg(long)]
    pub city: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long)]
    pub chromium_path: Option<PathBuf>,

    /// Disable the Chromium sandbox
    #[arg(long)]
    pub no_sandbox: bool,

    /// Output directory for the report and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// How visual effects are awaited
    #[arg(long)]
    pub settle: Option<SettleArg>,

    /// YAML configuration file
    #[arg(short, long, env = "AFISHA_CONFIG")]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Apply the flags given on the command line on top of `config`
    pub fn apply(&self, config: &mut ProbeConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(retries) = self.retries {
            config.retries = Some(retries);
        }
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(ref city) = self.city {
            config.city = city.clone();
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(ref path) = self.chromium_path {
            config.chromium_path = Some(path.to_string_lossy().to_string());
        }
        if self.no_sandbox {
            config.sandbox = false;
        }
        if let Some(ref output) = self.output {
            config.output_dir = output.clone();
        }
        if self.fail_fast {
            config.fail_fast = true;
        }
        if let Some(settle) = self.settle {
            config.settle.mode = settle.into();
        }
    }
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the locators command
#[derive(Parser, Debug)]
pub struct LocatorsArgs {
    /// Registry name, e.g. eventCardRoot
    pub name: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, env = "AFISHA_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Settle strategy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleArg {
    /// Sleep the configured delay
    Fixed,
    /// Poll until the page stops changing
    Stable,
}

impl From<SettleArg> for SettleMode {
    fn from(arg: SettleArg) -> Self {
        match arg {
            SettleArg::Fixed => Self::Fixed,
            SettleArg::Stable => Self::UntilStable,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_flags() {
            let cli = Cli::parse_from([
                "afisha-probe",
                "run",
                "--filter",
                "calendar",
                "--seed",
                "42",
                "-j",
                "3",
                "--retries",
                "1",
                "--city",
                "spb",
                "--headed",
                "--fail-fast",
                "--settle",
                "fixed",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.filter.as_deref(), Some("calendar"));
            assert_eq!(args.seed, Some(42));
            assert_eq!(args.workers, Some(3));
            assert_eq!(args.retries, Some(1));
            assert!(args.headed);
            assert!(args.fail_fast);
            assert_eq!(args.settle, Some(SettleArg::Fixed));
        }

        #[test]
        fn test_locators_name() {
            let cli = Cli::parse_from(["afisha-probe", "locators", "eventCardRoot"]);
            let Commands::Locators(args) = cli.command else {
                panic!("expected Locators command");
            };
            assert_eq!(args.name.as_deref(), Some("eventCardRoot"));
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["afisha-probe", "-vv", "--color", "never", "list"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.color, ColorArg::Never);
            assert!(matches!(cli.command, Commands::List(_)));
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn test_unset_flags_keep_config() {
            let mut config = ProbeConfig::default();
            RunArgs::default().apply(&mut config);
            assert_eq!(config, ProbeConfig::default());
        }

        #[test]
        fn test_flags_override_config() {
            let args = RunArgs {
                seed: Some(7),
                workers: Some(2),
                base_url: Some("https://afisha.test/".to_string()),
                headed: true,
                no_sandbox: true,
                settle: Some(SettleArg::Fixed),
                output: Some(PathBuf::from("out")),
                ..RunArgs::default()
            };
            let mut config = ProbeConfig::default();
            args.apply(&mut config);
            assert_eq!(config.seed, Some(7));
            assert_eq!(config.workers, 2);
            assert_eq!(config.base_url, "https://afisha.test");
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.settle.mode, SettleMode::Fixed);
            assert_eq!(config.output_dir, PathBuf::from("out"));
        }
    }
}
