use harness_config::{HarnessConfig, ServiceKind};
use reqwest::blocking::Response;
use serde::Serialize;
use serde_json::Value;

use crate::{response::xml_to_json, GateKeeperService, ServiceClient, ServiceResult};

/// Producer: broadcast schedules and the XML feed built from a pack.
pub struct ProducerService<'c> {
    client: ServiceClient<'c>,
}

impl<'c> ProducerService<'c> {
    pub fn new(config: &'c HarnessConfig) -> ServiceResult<Self> {
        Ok(ProducerService {
            client: ServiceClient::new(config, ServiceKind::Producer)?,
        })
    }

    pub fn for_session(gatekeeper: &GateKeeperService<'c>) -> ServiceResult<Self> {
        Ok(ProducerService {
            client: gatekeeper.session_client(ServiceKind::Producer)?,
        })
    }

    pub fn client(&self) -> &ServiceClient<'c> {
        &self.client
    }

    pub fn list_schedules(&self, query: &[(&str, &str)]) -> ServiceResult<Response> {
        self.client.get("schedule", "v1", &[], query)
    }

    pub fn create_schedule<T: Serialize + ?Sized>(&self, schedule: &T) -> ServiceResult<Response> {
        self.client.post_json("schedule", "v1", &[], schedule)
    }

    pub fn delete_schedule(&self, id: &str) -> ServiceResult<Response> {
        self.client.delete("schedule", "v1_item", &[id])
    }

    pub fn feed_raw(&self, pack_id: &str) -> ServiceResult<Response> {
        self.client.get("feed", "xml", &[pack_id], &[])
    }

    /// The pack feed converted to JSON.
    pub fn feed(&self, pack_id: &str) -> ServiceResult<Value> {
        let body = self.feed_raw(pack_id)?.text()?;
        xml_to_json(&body)
    }
}
