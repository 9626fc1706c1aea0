use std::{collections::BTreeMap, path::Path};

use config::{Config, Environment as EnvSource, File};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    registry::builtin, ConfigResult, Environment, HarnessConfig, HttpSettings, ResourcePaths,
    ServiceConfig, ServiceKind,
};

/// Shape of an environment file. Every service or API resource present in the
/// file replaces the built-in one as a whole.
#[derive(Debug, Deserialize)]
struct EnvironmentFile {
    environment: String,
    #[serde(default)]
    services: BTreeMap<String, ServiceConfig>,
    #[serde(default)]
    api: BTreeMap<String, BTreeMap<String, ResourcePaths>>,
    #[serde(default)]
    http: Option<HttpSettings>,
}

/// Loads an environment file (TOML, YAML or JSON, chosen by extension) on
/// top of the built-in registry for the environment it names. `HARNESS__*`
/// variables override file values, e.g. `HARNESS__ENVIRONMENT=uat`.
pub fn load_file(path: &Path) -> ConfigResult<HarnessConfig> {
    info!("loading environment file {}", path.display());

    let file: EnvironmentFile = Config::builder()
        .add_source(File::from(path))
        .add_source(
            EnvSource::with_prefix("HARNESS")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;

    let environment: Environment = file.environment.parse()?;
    let mut builder = builtin(environment);

    for (key, service) in file.services {
        let kind: ServiceKind = key.parse()?;
        debug!(service = %kind, "environment file replaces service sub-tree");
        builder.set_service(kind, service);
    }

    for (key, resources) in file.api {
        let kind: ServiceKind = key.parse()?;
        for (resource, paths) in resources {
            debug!(service = %kind, %resource, "environment file replaces API resource");
            builder.api_mut().insert_resource(kind, &resource, paths);
        }
    }

    if let Some(http) = file.http {
        builder.set_http(http);
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::ConfigError;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    #[serial]
    fn test_file_replaces_whole_service() -> ConfigResult<()> {
        let file = write_file(
            ".toml",
            r#"
environment = "test"

[services.gatekeeper]
scheme = "http"
host = "gk.sandbox.lan"
port = 9000

[services.gatekeeper.db]
type = "sqlite"
name = "/tmp/gatekeeper.db"

[api.gatekeeper.login]
POST = "accounts/login/"

[http]
verify_tls = true
"#,
        );

        let config = load_file(file.path())?;
        let gatekeeper = config.service(ServiceKind::Gatekeeper)?;

        assert_eq!(config.environment(), Environment::Test);
        assert_eq!(gatekeeper.base_url(), "http://gk.sandbox.lan:9000/");
        assert_eq!(gatekeeper.credentials, None);
        assert_eq!(
            config.db(ServiceKind::Gatekeeper)?.connection_string(),
            "sqlite:////tmp/gatekeeper.db"
        );
        assert_eq!(
            config.api().template(ServiceKind::Gatekeeper, "login", "POST")?,
            "accounts/login/"
        );
        assert!(config
            .api()
            .template(ServiceKind::Gatekeeper, "login", "GET")
            .is_err());
        assert_eq!(
            config.api().template(ServiceKind::Gatekeeper, "logout", "GET")?,
            "logout/"
        );
        assert!(config.http().verify_tls);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_file_with_unknown_environment() {
        let file = write_file(".yaml", "environment: production\n");
        assert!(matches!(
            load_file(file.path()),
            Err(ConfigError::EnvironmentNotFound(_))
        ));
    }

    #[test]
    #[serial]
    fn test_file_with_unknown_service() {
        let file = write_file(
            ".toml",
            "environment = \"dev\"\n[services.billing]\nhost = \"billing.lan\"\n",
        );
        assert!(matches!(
            load_file(file.path()),
            Err(ConfigError::UnknownService(name)) if name == "billing"
        ));
    }

    #[test]
    #[serial]
    fn test_harness_variables_override_file_values() -> ConfigResult<()> {
        let file = write_file(
            ".toml",
            r#"
environment = "test"

[services.gatekeeper]
scheme = "http"
host = "gk.sandbox.lan"
port = 9000
"#,
        );

        std::env::set_var("HARNESS__ENVIRONMENT", "uat");
        std::env::set_var("HARNESS__SERVICES__GATEKEEPER__HOST", "gk.override.lan");
        let loaded = load_file(file.path());
        std::env::remove_var("HARNESS__ENVIRONMENT");
        std::env::remove_var("HARNESS__SERVICES__GATEKEEPER__HOST");

        let config = loaded?;
        assert_eq!(config.environment(), Environment::Uat);
        assert_eq!(
            config.service(ServiceKind::Gatekeeper)?.base_url(),
            "http://gk.override.lan:9000/"
        );
        Ok(())
    }

    #[test]
    #[serial]
    fn test_partial_http_section_keeps_default_timeout() -> ConfigResult<()> {
        let file = write_file(".toml", "environment = \"dev\"\n[http]\nverify_tls = true\n");
        let config = load_file(file.path())?;
        assert!(config.http().verify_tls);
        assert_eq!(config.http().timeout_secs, HttpSettings::default().timeout_secs);
        Ok(())
    }
}
