use harness_config::{HarnessConfig, ServiceKind};
use model::Pack;
use reqwest::blocking::Response;

use crate::{GateKeeperService, ServiceClient, ServiceResult};

/// Screen writer packs: authoring, content and publishing.
pub struct PackService<'c> {
    client: ServiceClient<'c>,
}

impl<'c> PackService<'c> {
    pub fn new(config: &'c HarnessConfig) -> ServiceResult<Self> {
        Ok(PackService {
            client: ServiceClient::new(config, ServiceKind::ScreenWriter)?,
        })
    }

    pub fn for_session(gatekeeper: &GateKeeperService<'c>) -> ServiceResult<Self> {
        Ok(PackService {
            client: gatekeeper.session_client(ServiceKind::ScreenWriter)?,
        })
    }

    pub fn client(&self) -> &ServiceClient<'c> {
        &self.client
    }

    pub fn list_packs(&self, query: &[(&str, &str)]) -> ServiceResult<Response> {
        self.client.get("pack", "GET", &[], query)
    }

    pub fn get_pack(&self, id: &str) -> ServiceResult<Response> {
        self.client.get("pack", "item", &[id], &[])
    }

    pub fn create_pack(&self, pack: &Pack) -> ServiceResult<Response> {
        self.client.post_json("pack", "POST", &[], pack)
    }

    pub fn update_pack(&self, id: &str, pack: &Pack) -> ServiceResult<Response> {
        self.client.put_json("pack", "item", &[id], pack)
    }

    pub fn delete_pack(&self, id: &str) -> ServiceResult<Response> {
        self.client.delete("pack", "item", &[id])
    }

    pub fn pack_content(&self, id: &str) -> ServiceResult<Response> {
        self.client.get("pack_content", "GET", &[id], &[])
    }

    pub fn publish_pack(&self, id: &str) -> ServiceResult<Response> {
        self.client.post_form("pack_publish", "POST", &[id], &[])
    }
}
