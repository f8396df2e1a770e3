//! These structs provide the CLI interface for the icms CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// icms: the backend of a public-finance dashboard.
///
/// The purpose of this program is to poll the Tesouro datalake for ICMS
/// revenue figures through two independent feeds (Tesouro and SICONFI),
/// snapshot the filtered rows as CSV files, and serve them as JSON for the
/// dashboard frontend, along with a monthly reconciliation between the two
/// feeds.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and write a default config.json.
    ///
    /// This is the first command you should run. Edit the generated file to
    /// change the fiscal year, entity id, frontend origin or bind address.
    Init,

    /// Run one refresh cycle (fetch both sources, filter, replace the CSV
    /// snapshots) and exit. Useful from an external cron, or to warm the
    /// caches before the first `serve`.
    Refresh,

    /// Print the monthly reconciliation between the two sources.
    Report,

    /// Run the HTTP API and the periodic refresh scheduler until ctrl-c.
    Serve,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate
    /// for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where icms data and configuration is held. Defaults to
    /// ~/icms
    #[arg(long, env = "ICMS_HOME", default_value_t = default_icms_home())]
    icms_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, icms_home: PathBuf) -> Self {
        Self {
            log_level,
            icms_home: icms_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn icms_home(&self) -> &DisplayPath {
        &self.icms_home
    }
}

/// A `PathBuf` wrapper that implements `Display` and `FromStr` so clap can
/// show it in `--help` defaults.
#[derive(Debug, Clone)]
pub struct DisplayPath(PathBuf);

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

fn default_icms_home() -> DisplayPath {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("icms")
        .into()
}
