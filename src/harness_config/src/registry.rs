//! # Environment configuration registry
//!
//! Every run starts by resolving one [`HarnessConfig`] for the selected
//! environment. The tree is composed "last write wins": [`set_base_config`]
//! writes the values shared by every environment, then one setter per backend
//! writes that backend's whole sub-tree (service descriptor and API paths).
//! Nothing merges below the sub-tree level, and the result is never mutated
//! afterwards; components receive it by reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    set_base_service_config, ApiPaths, ConfigError, ConfigResult, Credentials, DbConfig,
    Environment, ServiceConfig, ServiceKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Most deployments sit behind self-signed certificates.
    pub verify_tls: bool,
    pub timeout_secs: Option<u64>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            verify_tls: false,
            timeout_secs: Some(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarnessConfig {
    environment: Environment,
    services: BTreeMap<ServiceKind, ServiceConfig>,
    api: ApiPaths,
    http: HttpSettings,
}

impl HarnessConfig {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn service(&self, kind: ServiceKind) -> ConfigResult<&ServiceConfig> {
        self.services
            .get(&kind)
            .ok_or_else(|| ConfigError::ServiceNotConfigured(kind.key().to_string()))
    }

    pub fn services(&self) -> impl Iterator<Item = (&ServiceKind, &ServiceConfig)> {
        self.services.iter()
    }

    pub fn db(&self, kind: ServiceKind) -> ConfigResult<&DbConfig> {
        self.service(kind)?
            .db
            .as_ref()
            .ok_or_else(|| ConfigError::DatabaseNotConfigured(kind.key().to_string()))
    }

    pub fn api(&self) -> &ApiPaths {
        &self.api
    }

    pub fn http(&self) -> &HttpSettings {
        &self.http
    }
}

/// Mutable staging area the setters write into; only [`RegistryBuilder::finish`]
/// hands out a [`HarnessConfig`].
#[derive(Debug)]
pub struct RegistryBuilder {
    environment: Environment,
    services: BTreeMap<ServiceKind, ServiceConfig>,
    api: ApiPaths,
    http: HttpSettings,
}

impl RegistryBuilder {
    pub fn new(environment: Environment) -> Self {
        RegistryBuilder {
            environment,
            services: BTreeMap::new(),
            api: ApiPaths::default(),
            http: HttpSettings::default(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn set_service(&mut self, kind: ServiceKind, service: ServiceConfig) -> &mut Self {
        self.services.insert(kind, service.normalized());
        self
    }

    pub fn api_mut(&mut self) -> &mut ApiPaths {
        &mut self.api
    }

    pub fn set_http(&mut self, http: HttpSettings) -> &mut Self {
        self.http = http;
        self
    }

    pub fn finish(self) -> HarnessConfig {
        HarnessConfig {
            environment: self.environment,
            services: self.services,
            api: self.api,
            http: self.http,
        }
    }
}

/// Resolves the built-in configuration tree for `environment_name`.
pub fn load(environment_name: &str) -> ConfigResult<HarnessConfig> {
    let environment: Environment = environment_name.parse()?;
    Ok(builtin(environment).finish())
}

pub(crate) fn builtin(environment: Environment) -> RegistryBuilder {
    debug!(%environment, "building configuration registry");

    let mut builder = RegistryBuilder::new(environment);
    set_base_config(&mut builder);
    set_gatekeeper_config(&mut builder);
    set_courier_config(&mut builder);
    set_screen_writer_config(&mut builder);
    set_producer_config(&mut builder);
    builder
}

/// Values shared by every environment.
pub fn set_base_config(builder: &mut RegistryBuilder) {
    builder.set_service(
        ServiceKind::GoogleServer,
        set_base_service_config("https", "www.google.com", None, Some(443), None, None),
    );
    builder
        .api_mut()
        .set_resource(ServiceKind::GoogleServer, "health", &[("GET", "generate_204")]);
    builder.set_http(HttpSettings::default());
}

pub fn set_gatekeeper_config(builder: &mut RegistryBuilder) {
    let service = match builder.environment() {
        Environment::Dev => set_base_service_config(
            "http",
            "localhost",
            Some("127.0.0.1"),
            Some(8000),
            Some(Credentials::new("admin", "admin")),
            Some(DbConfig::postgresql(
                "localhost",
                5432,
                "gatekeeper",
                Credentials::new("gatekeeper", "gatekeeper"),
            )),
        ),
        Environment::Test => set_base_service_config(
            "https",
            "gatekeeper.test.internal",
            Some("10.20.0.11"),
            Some(443),
            Some(Credentials::new("qa-admin", "qa-admin")),
            Some(DbConfig::postgresql(
                "gatekeeper-db.test.internal",
                5432,
                "gatekeeper",
                Credentials::new("gatekeeper", "gatekeeper-test"),
            )),
        ),
        Environment::Uat => set_base_service_config(
            "https",
            "gatekeeper.uat.internal",
            Some("10.30.0.11"),
            Some(443),
            Some(Credentials::new("qa-admin", "qa-admin-uat")),
            Some(DbConfig::postgresql(
                "gatekeeper-db.uat.internal",
                5432,
                "gatekeeper",
                Credentials::new("gatekeeper", "gatekeeper-uat"),
            )),
        ),
    };
    builder.set_service(ServiceKind::Gatekeeper, service);

    let api = builder.api_mut();
    let gk = ServiceKind::Gatekeeper;
    api.set_resource(gk, "login", &[("POST", "login/"), ("GET", "login/")]);
    api.set_resource(gk, "login_verify", &[("POST", "login/verify/")]);
    api.set_resource(gk, "logout", &[("GET", "logout/")]);
    api.set_resource(gk, "session", &[("v1", "api/v1/session/")]);
    api.set_resource(gk, "user", &[("v1", "api/v1/user/"), ("v1_item", "api/v1/user/%s/")]);
    api.set_resource(
        gk,
        "application",
        &[("v1", "api/v1/application/"), ("v1_item", "api/v1/application/%s/")],
    );
    api.set_resource(gk, "group", &[("v1", "api/v1/group/"), ("v1_item", "api/v1/group/%s/")]);
    api.set_resource(
        gk,
        "permission",
        &[("v1", "api/v1/permission/"), ("v1_check", "api/v1/permission/%s/%s/")],
    );
}

pub fn set_courier_config(builder: &mut RegistryBuilder) {
    let service = match builder.environment() {
        Environment::Dev => set_base_service_config(
            "http",
            "localhost",
            Some("127.0.0.1"),
            Some(8001),
            None,
            Some(DbConfig::sqlite("courier.sqlite3")),
        ),
        Environment::Test => set_base_service_config(
            "https",
            "courier.test.internal",
            Some("10.20.0.12"),
            Some(443),
            None,
            Some(DbConfig::postgresql(
                "courier-db.test.internal",
                5432,
                "courier",
                Credentials::new("courier", "courier-test"),
            )),
        ),
        Environment::Uat => set_base_service_config(
            "https",
            "courier.uat.internal",
            Some("10.30.0.12"),
            Some(443),
            None,
            Some(DbConfig::postgresql(
                "courier-db.uat.internal",
                5432,
                "courier",
                Credentials::new("courier", "courier-uat"),
            )),
        ),
    };
    builder.set_service(ServiceKind::Courier, service);

    let api = builder.api_mut();
    let courier = ServiceKind::Courier;
    api.set_resource(
        courier,
        "package",
        &[("v1", "api/v1/package/"), ("v1_item", "api/v1/package/%s/")],
    );
    api.set_resource(
        courier,
        "device",
        &[("v1", "api/v1/device/"), ("v1_item", "api/v1/device/%s/")],
    );
}

pub fn set_screen_writer_config(builder: &mut RegistryBuilder) {
    let service = match builder.environment() {
        Environment::Dev => set_base_service_config(
            "http",
            "localhost",
            Some("127.0.0.1"),
            Some(8002),
            None,
            Some(DbConfig::postgresql(
                "localhost",
                5432,
                "screen_writer",
                Credentials::new("screen_writer", "screen_writer"),
            )),
        ),
        Environment::Test => set_base_service_config(
            "https",
            "tms.test.internal",
            Some("10.20.0.13"),
            Some(443),
            None,
            Some(DbConfig::postgresql(
                "tms-db.test.internal",
                5432,
                "screen_writer",
                Credentials::new("screen_writer", "tms-test"),
            )),
        ),
        Environment::Uat => set_base_service_config(
            "https",
            "tms.uat.internal",
            Some("10.30.0.13"),
            Some(443),
            None,
            Some(DbConfig::postgresql(
                "tms-db.uat.internal",
                5432,
                "screen_writer",
                Credentials::new("screen_writer", "tms-uat"),
            )),
        ),
    };
    builder.set_service(ServiceKind::ScreenWriter, service);

    let api = builder.api_mut();
    let sw = ServiceKind::ScreenWriter;
    api.set_resource(
        sw,
        "pack",
        &[("GET", "core/pack/"), ("POST", "core/pack/"), ("item", "core/pack/%s/")],
    );
    api.set_resource(sw, "pack_content", &[("GET", "core/pack/%s/content/")]);
    api.set_resource(sw, "pack_publish", &[("POST", "core/pack/%s/publish/")]);
}

pub fn set_producer_config(builder: &mut RegistryBuilder) {
    let service = match builder.environment() {
        Environment::Dev => set_base_service_config(
            "http",
            "localhost",
            Some("127.0.0.1"),
            Some(8003),
            None,
            Some(DbConfig::sqlite("producer.sqlite3")),
        ),
        Environment::Test => set_base_service_config(
            "https",
            "producer.test.internal",
            Some("10.20.0.14"),
            Some(443),
            None,
            Some(DbConfig::postgresql(
                "producer-db.test.internal",
                5432,
                "producer",
                Credentials::new("producer", "producer-test"),
            )),
        ),
        Environment::Uat => set_base_service_config(
            "https",
            "producer.uat.internal",
            Some("10.30.0.14"),
            Some(443),
            None,
            Some(DbConfig::postgresql(
                "producer-db.uat.internal",
                5432,
                "producer",
                Credentials::new("producer", "producer-uat"),
            )),
        ),
    };
    builder.set_service(ServiceKind::Producer, service);

    let api = builder.api_mut();
    let producer = ServiceKind::Producer;
    api.set_resource(
        producer,
        "schedule",
        &[("v1", "api/v1/schedule/"), ("v1_item", "api/v1/schedule/%s/")],
    );
    api.set_resource(producer, "feed", &[("xml", "api/v1/feed/%s.xml")]);
}
