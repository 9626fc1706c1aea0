use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use harness_config::HarnessConfig;
use serde::Serialize;
use tracing::debug;

pub mod cmd;
pub mod format;
pub mod service_management;

#[derive(Debug, Clone, Copy, ValueEnum, Default, Serialize)]
pub enum LogMode {
    Full,
    Json,
    #[default]
    Compact,
}

impl From<LogMode> for service_management::logger::LoggingMode {
    fn from(mode: LogMode) -> Self {
        match mode {
            LogMode::Full => service_management::logger::LoggingMode::Full,
            LogMode::Json => service_management::logger::LoggingMode::Json,
            LogMode::Compact => service_management::logger::LoggingMode::Compact,
        }
    }
}

#[derive(Debug, Serialize, Parser, Clone)]
#[command(name = "gkharness", author, version, about = "End-to-end harness for the gatekeeper service family", long_about = None)]
pub struct Cli {
    /// Environment to run against (dev, test, uat)
    #[arg(short, long, default_value = "dev", env = "HARNESS_ENV")]
    pub env: String,

    /// Environment file overriding the built-in registry (TOML or YAML)
    #[arg(short, long, value_name = "FILE", env = "HARNESS_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Turn debugging information on (repeat for higher levels)
    #[arg(short, long, action = clap::ArgAction::Count, env = "HARNESS_DEBUG")]
    pub debug: u8,

    #[command(subcommand)]
    pub command: CliCommands,

    /// Output logs in json format.
    #[clap(long, value_enum)]
    pub log_mode: Option<LogMode>,

    /// File for logs to be written to
    #[arg(long, value_parser)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The configuration this invocation runs with: the environment file when
    /// one is given, otherwise the built-in registry for `--env`.
    pub fn harness_config(&self) -> anyhow::Result<HarnessConfig> {
        let config = match &self.config {
            Some(path) => harness_config::load_file(path)
                .with_context(|| format!("[gkharness] loading environment file {}", path.display()))?,
            None => harness_config::load(&self.env)
                .with_context(|| format!("[gkharness] resolving environment '{}'", self.env))?,
        };
        debug!(environment = %config.environment(), "configuration resolved");
        Ok(config)
    }
}

#[derive(Debug, Serialize, Subcommand, Clone)]
pub enum CliCommands {
    Config(ConfigArgs),
    Run(RunArgs),
    SimulateUsers(SimulateUsersArgs),
    UserCycle(UserCycleArgs),
    Admin(AdminArgs),
}

/// Inspect the resolved configuration
#[derive(Debug, Serialize, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Serialize, Subcommand, Clone)]
pub enum ConfigCommands {
    /// print every service of the selected environment
    Show {
        /// emit the whole tree as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// list the test sets `run` accepts
    TestSets,
}

/// Run a named set of end-to-end tests against the selected environment
#[derive(Debug, Serialize, Args, Clone)]
pub struct RunArgs {
    /// test set name, see `config test-sets`
    pub test_set: String,

    /// write the captured test output to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// Log in and out with many users at once, one process per user
#[derive(Debug, Serialize, Args, Clone)]
pub struct SimulateUsersArgs {
    /// number of concurrent users
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: usize,

    /// user name to log in as; defaults to the configured gatekeeper credentials
    #[arg(long, env = "HARNESS_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "HARNESS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// One login, session check and logout cycle
#[derive(Debug, Serialize, Args, Clone)]
pub struct UserCycleArgs {
    /// user name to log in as; defaults to the configured gatekeeper credentials
    #[arg(long, env = "HARNESS_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "HARNESS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// label used in log output when run under `simulate-users`
    #[arg(long, default_value_t = 0)]
    pub worker: usize,
}

/// Admin / maintenance utilities
#[derive(Debug, Serialize, Args, Clone)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommands,
}

#[derive(Debug, Serialize, Subcommand, Clone)]
pub enum AdminCommands {
    /// generate CLI help markdown
    CliHelpMd,
}

pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        CliCommands::Config(args) => args.command.execute(cli),
        CliCommands::Run(args) => args.execute(cli),
        CliCommands::SimulateUsers(args) => args.execute(cli),
        CliCommands::UserCycle(args) => args.execute(cli),
        CliCommands::Admin(args) => args.command.execute(cli),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_named_after_the_binary() {
        let command = Cli::command();
        assert_eq!(command.get_name(), "gkharness");
        command.debug_assert();
    }
}
