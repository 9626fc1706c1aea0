use anyhow::{bail, Context};
use harness_config::ConfigError;
use subprocess::{Exec, ExitStatus, Redirection};
use tracing::{error, info};

use crate::{Cli, RunArgs};

/// A named group of live test targets from the `e2e_suite` crate.
#[derive(Debug)]
pub struct TestSet {
    pub name: &'static str,
    pub description: &'static str,
    /// Integration test targets; empty means every target.
    pub targets: &'static [&'static str],
}

impl TestSet {
    pub fn targets_label(&self) -> String {
        if self.targets.is_empty() {
            "*".to_string()
        } else {
            self.targets.join(", ")
        }
    }

    /// `cargo` arguments that run this set's ignored (live) tests.
    pub fn cargo_args(&self) -> Vec<&'static str> {
        let mut args = vec!["test", "-p", "e2e_suite"];
        if self.targets.is_empty() {
            args.push("--tests");
        }
        for target in self.targets {
            args.extend(["--test", *target]);
        }
        args.extend(["--", "--ignored", "--test-threads=1"]);
        args
    }
}

pub const TEST_SETS: &[TestSet] = &[
    TestSet {
        name: "smoke",
        description: "every backend answers and the admin can log in",
        targets: &["smoke"],
    },
    TestSet {
        name: "gatekeeper",
        description: "login, logout, users, applications, groups and permissions",
        targets: &["gatekeeper"],
    },
    TestSet {
        name: "two-factor",
        description: "verification-code login flow",
        targets: &["two_factor"],
    },
    TestSet {
        name: "courier",
        description: "packages and devices",
        targets: &["courier"],
    },
    TestSet {
        name: "screen-writer",
        description: "pack authoring and publishing",
        targets: &["screen_writer"],
    },
    TestSet {
        name: "producer",
        description: "schedules and the XML feed",
        targets: &["producer"],
    },
    TestSet {
        name: "all",
        description: "every live test",
        targets: &[],
    },
];

pub fn test_set(name: &str) -> Result<&'static TestSet, ConfigError> {
    TEST_SETS
        .iter()
        .find(|set| set.name == name)
        .ok_or_else(|| ConfigError::UnknownTestSet(name.to_string()))
}

impl RunArgs {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let set = test_set(&self.test_set)?;
        let config = cli.harness_config()?;
        info!(test_set = set.name, environment = %config.environment(), "running test set");

        let mut exec = Exec::cmd("cargo")
            .args(set.cargo_args().as_slice())
            .env("HARNESS_ENV", config.environment().name());
        if let Some(file) = &cli.config {
            exec = exec.env("HARNESS_CONFIG_FILE", file);
        }
        let capture = exec
            .stdout(Redirection::Pipe)
            .stderr(Redirection::Merge)
            .capture()
            .context("[gkharness run] spawning cargo test")?;
        let output = capture.stdout_str();
        print!("{output}");

        if let Some(path) = &self.report {
            let report = render_report(set, config.environment().name(), &capture.exit_status, &output);
            std::fs::write(path, report)
                .with_context(|| format!("[gkharness run] writing report {}", path.display()))?;
            info!("report written to {}", path.display());
        }

        if !capture.exit_status.success() {
            error!(test_set = set.name, status = ?capture.exit_status, "test set failed");
            bail!("test set '{}' failed ({:?})", set.name, capture.exit_status);
        }
        Ok(())
    }
}

pub fn render_report(set: &TestSet, environment: &str, status: &ExitStatus, output: &str) -> String {
    let outcome = if status.success() { "passed" } else { "failed" };
    let mut report = format!(
        "# Test set `{}` {outcome}\n\n- environment: {environment}\n- targets: {}\n- exit status: {status:?}\n",
        set.name,
        set.targets_label(),
    );
    let summaries: Vec<String> = output
        .lines()
        .filter(|line| line.starts_with("test result:"))
        .map(|line| format!("    {line}\n"))
        .collect();
    if !summaries.is_empty() {
        report.push('\n');
        report.push_str(&summaries.concat());
    }
    report.push_str(&format!("\n```text\n{}\n```\n", output.trim_end()));
    report
}
