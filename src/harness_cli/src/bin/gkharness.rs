use clap::Parser;
use harness_cli::{service_management, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    service_management::start(&cli)?;
    harness_cli::execute(&cli)
}
