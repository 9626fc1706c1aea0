//! Shared fixtures for the live end-to-end tests in `tests/`.
//!
//! Those tests are `#[ignore]`d so a plain `cargo test` never reaches out to
//! a deployment; `gkharness run <set>` runs them with `--ignored` and selects
//! the environment through `HARNESS_ENV` / `HARNESS_CONFIG_FILE`.

use std::{path::PathBuf, sync::Once};

use anyhow::{anyhow, bail, Context};
use harness_config::{HarnessConfig, ServiceKind};
use model::{Model, ModelCrud};
use reqwest::blocking::Response;
use serde_json::Value;
use services::{response::envelope, GateKeeperService, LoginState};
use tracing::info;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct HarnessContext {
    config: HarnessConfig,
}

impl HarnessContext {
    pub fn new(config: HarnessConfig) -> Self {
        init_logging();
        HarnessContext { config }
    }

    /// Resolves the configuration the same way `gkharness` does.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = match std::env::var_os("HARNESS_CONFIG_FILE") {
            Some(file) => {
                let path = PathBuf::from(file);
                harness_config::load_file(&path)
                    .with_context(|| format!("loading environment file {}", path.display()))?
            }
            None => {
                let env = std::env::var("HARNESS_ENV").unwrap_or_else(|_| "dev".to_string());
                harness_config::load(&env)?
            }
        };
        let context = HarnessContext::new(config);
        info!(environment = %context.config.environment(), "e2e context ready");
        Ok(context)
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn gatekeeper(&self) -> anyhow::Result<GateKeeperService<'_>> {
        Ok(GateKeeperService::new(&self.config)?)
    }

    /// A gatekeeper session logged in with the configured credentials.
    pub fn admin_session(&self) -> anyhow::Result<GateKeeperService<'_>> {
        let mut gatekeeper = self.gatekeeper()?;
        let response = gatekeeper.login_as_admin()?;
        if gatekeeper.state() != LoginState::Authenticated {
            bail!("admin login ended {:?} with {}", gatekeeper.state(), response.status());
        }
        Ok(gatekeeper)
    }

    pub fn dao(&self, service: ServiceKind) -> anyhow::Result<Box<dyn dao::Dao>> {
        let connection_string = self.config.db(service)?.connection_string();
        Ok(dao::connect(&connection_string)?)
    }

    /// CRUD access to `service`'s database for fixtures and assertions.
    pub fn crud<M: Model>(&self, service: ServiceKind) -> anyhow::Result<ModelCrud<M>> {
        Ok(ModelCrud::new(self.dao(service)?)?)
    }
}

/// `<prefix>-<8 hex chars>`, unique enough for records created per test run.
pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}

/// Fails with the response body when the status is not one of `expected`.
pub fn expect_status(response: Response, expected: &[u16]) -> anyhow::Result<Response> {
    let status = response.status().as_u16();
    if expected.contains(&status) {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    Err(anyhow!("{url} answered {status}, expected {expected:?}: {body}"))
}

/// Identifier of the record a create call returned in its envelope.
pub fn created_id(response: Response) -> anyhow::Result<String> {
    let envelope = envelope::<Value>(expect_status(response, &[200, 201])?)?;
    let id = envelope
        .data
        .as_ref()
        .and_then(|data| data.get("id"))
        .ok_or_else(|| anyhow!("no id in create response: {:?}", envelope.messages))?;
    Ok(match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_names() {
        let a = unique_name("e2e-user");
        let b = unique_name("e2e-user");
        assert!(a.starts_with("e2e-user-"));
        assert_eq!(a.len(), "e2e-user-".len() + 8);
        assert_ne!(a, b);
    }
}
