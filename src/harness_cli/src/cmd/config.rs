use dao::redact;

use crate::{
    cmd::TEST_SETS,
    format::{as_ascii_table, or_dash},
    Cli, ConfigCommands,
};

impl ConfigCommands {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        match self {
            ConfigCommands::Show { json } => self.show(cli, *json),
            ConfigCommands::TestSets => {
                let rows = TEST_SETS.iter().map(|set| {
                    vec![
                        set.name.to_string(),
                        set.targets_label(),
                        set.description.to_string(),
                    ]
                });
                println!("{}", as_ascii_table(["test set", "targets", "description"], rows));
                Ok(())
            }
        }
    }

    fn show(&self, cli: &Cli, json: bool) -> anyhow::Result<()> {
        let config = cli.harness_config()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }

        let rows = config.services().map(|(kind, service)| {
            vec![
                kind.key().to_string(),
                service.base_url(),
                or_dash(service.ip.as_deref()),
                or_dash(service.db.as_ref().map(|db| db.db_type.scheme())),
                or_dash(service.db.as_ref().map(|db| redact(&db.connection_string()))),
            ]
        });
        println!("environment: {}", config.environment());
        println!(
            "{}",
            as_ascii_table(["service", "base url", "ip", "db", "connection"], rows)
        );
        Ok(())
    }
}
