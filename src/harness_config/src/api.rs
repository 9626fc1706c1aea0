use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, ServiceKind};

const PLACEHOLDER: &str = "%s";

/// Method-or-version key (`GET`, `POST`, `v1`, `v1_item`, ...) to path template.
/// Keys compare case-insensitively since file sources lowercase them.
pub type ResourcePaths = BTreeMap<String, String>;

/// service key -> resource name -> method-or-version key -> path template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiPaths(BTreeMap<String, BTreeMap<String, ResourcePaths>>);

impl ApiPaths {
    pub fn set_resource(&mut self, service: ServiceKind, resource: &str, entries: &[(&str, &str)]) {
        let paths = entries
            .iter()
            .map(|(key, template)| (key.to_string(), template.to_string()))
            .collect();
        self.insert_resource(service, resource, paths);
    }

    pub fn insert_resource(&mut self, service: ServiceKind, resource: &str, paths: ResourcePaths) {
        let paths = paths
            .into_iter()
            .map(|(key, template)| (key.to_ascii_lowercase(), template))
            .collect();
        self.0
            .entry(service.key().to_string())
            .or_default()
            .insert(resource.to_string(), paths);
    }

    pub fn resources(&self, service: ServiceKind) -> Option<&BTreeMap<String, ResourcePaths>> {
        self.0.get(service.key())
    }

    pub fn template(&self, service: ServiceKind, resource: &str, key: &str) -> ConfigResult<&str> {
        self.0
            .get(service.key())
            .and_then(|resources| resources.get(resource))
            .and_then(|paths| paths.get(&key.to_ascii_lowercase()))
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownApiPath {
                service: service.key().to_string(),
                resource: resource.to_string(),
                key: key.to_string(),
            })
    }

    pub fn path(
        &self,
        service: ServiceKind,
        resource: &str,
        key: &str,
        params: &[&str],
    ) -> ConfigResult<String> {
        fill_path(self.template(service, resource, key)?, params)
    }
}

/// Substitutes every `%s` in `template`, left to right.
pub fn fill_path(template: &str, params: &[&str]) -> ConfigResult<String> {
    let expected = template.matches(PLACEHOLDER).count();
    if expected != params.len() {
        return Err(ConfigError::PathArity {
            template: template.to_string(),
            expected,
            given: params.len(),
        });
    }

    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    for param in params {
        // the arity check above guarantees a placeholder remains
        if let Some(at) = rest.find(PLACEHOLDER) {
            path.push_str(&rest[..at]);
            path.push_str(param);
            rest = &rest[at + PLACEHOLDER.len()..];
        }
    }
    path.push_str(rest);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_path() {
        assert_eq!(fill_path("api/v1/user/", &[]).unwrap(), "api/v1/user/");
        assert_eq!(fill_path("api/v1/user/%s/", &["42"]).unwrap(), "api/v1/user/42/");
        assert_eq!(
            fill_path("api/v1/permission/%s/%s/", &["courier", "can_publish"]).unwrap(),
            "api/v1/permission/courier/can_publish/"
        );
    }

    #[test]
    fn test_fill_path_arity() {
        let err = fill_path("core/pack/%s/", &[]).unwrap_err();
        assert!(matches!(err, ConfigError::PathArity { expected: 1, given: 0, .. }));
        assert!(fill_path("core/pack/", &["1"]).is_err());
    }

    #[test]
    fn test_lookup() {
        let mut api = ApiPaths::default();
        api.set_resource(ServiceKind::Gatekeeper, "user", &[("v1", "api/v1/user/"), ("v1_item", "api/v1/user/%s/")]);

        assert_eq!(
            api.path(ServiceKind::Gatekeeper, "user", "v1_item", &["7"]).unwrap(),
            "api/v1/user/7/"
        );
        assert!(matches!(
            api.template(ServiceKind::Courier, "user", "v1"),
            Err(ConfigError::UnknownApiPath { .. })
        ));
    }
}
