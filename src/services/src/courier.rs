use harness_config::{HarnessConfig, ServiceKind};
use reqwest::blocking::Response;
use serde::Serialize;

use crate::{GateKeeperService, ServiceClient, ServiceResult};

/// Courier: content packages and the devices they are delivered to.
pub struct CourierService<'c> {
    client: ServiceClient<'c>,
}

impl<'c> CourierService<'c> {
    pub fn new(config: &'c HarnessConfig) -> ServiceResult<Self> {
        Ok(CourierService {
            client: ServiceClient::new(config, ServiceKind::Courier)?,
        })
    }

    pub fn for_session(gatekeeper: &GateKeeperService<'c>) -> ServiceResult<Self> {
        Ok(CourierService {
            client: gatekeeper.session_client(ServiceKind::Courier)?,
        })
    }

    pub fn client(&self) -> &ServiceClient<'c> {
        &self.client
    }

    pub fn list_packages(&self, query: &[(&str, &str)]) -> ServiceResult<Response> {
        self.client.get("package", "v1", &[], query)
    }

    pub fn get_package(&self, id: &str) -> ServiceResult<Response> {
        self.client.get("package", "v1_item", &[id], &[])
    }

    pub fn create_package<T: Serialize + ?Sized>(&self, package: &T) -> ServiceResult<Response> {
        self.client.post_json("package", "v1", &[], package)
    }

    pub fn delete_package(&self, id: &str) -> ServiceResult<Response> {
        self.client.delete("package", "v1_item", &[id])
    }

    pub fn register_device<T: Serialize + ?Sized>(&self, device: &T) -> ServiceResult<Response> {
        self.client.post_json("device", "v1", &[], device)
    }

    pub fn list_devices(&self) -> ServiceResult<Response> {
        self.client.get("device", "v1", &[], &[])
    }
}
