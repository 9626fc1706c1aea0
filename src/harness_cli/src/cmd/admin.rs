use crate::{AdminCommands, Cli};

impl AdminCommands {
    pub fn execute(&self, _cli: &Cli) -> anyhow::Result<()> {
        match self {
            AdminCommands::CliHelpMd => {
                clap_markdown::print_help_markdown::<Cli>();
                Ok(())
            }
        }
    }
}
