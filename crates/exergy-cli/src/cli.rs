use clap::{Args, Parser, Subcommand, ValueEnum};
use exergy::engine::records::Tier;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Global Energy Tracker Contributors",
    version,
    about = "exergy CLI - Traces primary energy through useful energy to exergy-weighted energy services and measures how fast clean sources displace fossil fuels.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output and progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an observation series into useful energy and services, then compute displacement.
    Analyze(AnalyzeArgs),
    /// Load and validate coefficient tables and print the resolved coefficients per source.
    Validate(ValidateArgs),
    /// Inspect the engine configuration location.
    Config(ConfigArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierSelection {
    Primary,
    Useful,
    Services,
    /// Useful energy and energy services
    Both,
}

impl TierSelection {
    pub fn tiers(self) -> Vec<Tier> {
        match self {
            TierSelection::Primary => vec![Tier::Primary],
            TierSelection::Useful => vec![Tier::Useful],
            TierSelection::Services => vec![Tier::Services],
            TierSelection::Both => vec![Tier::Useful, Tier::Services],
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    // --- Core Arguments ---
    /// Path to the observations CSV (header: region,year,source,quantity,unit).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the engine configuration file in TOML format.
    /// Falls back to the default location, then to the built-in tables.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Analysis Selection ---
    /// Tier(s) for which displacement metrics are computed.
    #[arg(short, long, value_enum, default_value_t = TierSelection::Both)]
    pub tier: TierSelection,

    /// Restrict the analysis to these regions. Can be used multiple times.
    #[arg(short, long = "region", value_name = "NAME")]
    pub regions: Vec<String>,

    /// Skip the world-versus-regions reconciliation.
    #[arg(long)]
    pub no_reconcile: bool,

    // --- Coefficient Overrides ---
    /// Override the global rebound rate from the config file.
    #[arg(long, value_name = "RATE")]
    pub rebound: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S validation.split-tolerance=0.02
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    // --- Output ---
    /// Output format written to stdout.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the engine configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Year at which temporal efficiency profiles are evaluated.
    #[arg(short, long, default_value_t = 2024, value_name = "YEAR")]
    pub year: i32,

    /// Region used for regional overrides and the rebound class.
    #[arg(short, long, default_value = "World", value_name = "NAME")]
    pub region: String,

    /// Output format written to stdout.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the default, OS-specific configuration file location.
    Path,
}
