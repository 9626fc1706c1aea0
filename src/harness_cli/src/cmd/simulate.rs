use anyhow::{bail, Context};
use services::{GateKeeperService, LoginState};
use subprocess::{Exec, Popen, Redirection};
use tracing::{debug, info, warn};

use crate::{format::as_ascii_table, Cli, SimulateUsersArgs, UserCycleArgs};

impl SimulateUsersArgs {
    /// Spawns `count` `user-cycle` processes of this same binary, waits for
    /// all of them and reports each one.
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        if self.count == 0 {
            bail!("[gkharness simulate-users] --count must be at least 1");
        }
        let exe = std::env::current_exe().context("[gkharness simulate-users] locating own binary")?;

        let mut workers: Vec<(usize, Popen)> = Vec::with_capacity(self.count);
        for worker in 0..self.count {
            let mut exec = Exec::cmd(&exe).arg("--env").arg(&cli.env);
            if let Some(file) = &cli.config {
                exec = exec.arg("--config").arg(file);
            }
            exec = exec.arg("user-cycle").arg("--worker").arg(worker.to_string());
            if let Some(username) = &self.username {
                exec = exec.env("HARNESS_USERNAME", username);
            }
            if let Some(password) = &self.password {
                exec = exec.env("HARNESS_PASSWORD", password);
            }

            let popen = exec
                .stdout(Redirection::Pipe)
                .stderr(Redirection::Merge)
                .popen()
                .with_context(|| format!("[gkharness simulate-users] spawning worker {worker}"))?;
            debug!(worker, pid = ?popen.pid(), "worker started");
            workers.push((worker, popen));
        }

        let mut rows = Vec::with_capacity(workers.len());
        let mut failed = 0;
        for (worker, mut popen) in workers {
            let (output, _) = popen.communicate(None)?;
            let status = popen.wait()?;
            let last_line = output
                .as_deref()
                .and_then(|text| text.lines().rev().find(|line| !line.trim().is_empty()))
                .unwrap_or_default()
                .to_string();
            let outcome = if status.success() {
                "pass"
            } else {
                failed += 1;
                warn!(worker, ?status, "worker failed");
                "fail"
            };
            rows.push(vec![worker.to_string(), outcome.to_string(), last_line]);
        }

        println!("{}", as_ascii_table(["worker", "result", "last output"], rows));
        info!(users = self.count, failed, "simulation finished");
        if failed > 0 {
            bail!("{failed} of {} simulated users failed", self.count);
        }
        Ok(())
    }
}

impl UserCycleArgs {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = cli.harness_config()?;
        let mut gatekeeper = GateKeeperService::new(&config)?;

        let response = match (&self.username, &self.password) {
            (Some(username), Some(password)) => gatekeeper.login(username, password)?,
            _ => gatekeeper.login_as_admin()?,
        };
        if gatekeeper.state() != LoginState::Authenticated {
            bail!(
                "worker {}: login ended {:?} with status {}",
                self.worker,
                gatekeeper.state(),
                response.status()
            );
        }

        let session = gatekeeper.session_info()?;
        if let Some(error) = session.errors().next() {
            bail!("worker {}: session check failed: {error}", self.worker);
        }
        let logout = gatekeeper.logout()?;

        println!(
            "worker {} ok: login {}, logout {}",
            self.worker,
            response.status().as_u16(),
            logout.status().as_u16()
        );
        Ok(())
    }
}
