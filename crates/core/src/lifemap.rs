use crate::config::Settings;
use crate::domain::lifemap::{LifeMapData, LifeMapRequest};
use crate::remote::RemoteApiClient;

const TRENDS_PATH: &str = "/api/lifemap/trends";

/// Year-by-year trend projection. Remote only; there is no local fallback,
/// so a failed call surfaces to the caller directly.
#[derive(Debug, Clone)]
pub struct LifeMapClient {
    client: RemoteApiClient,
}

impl LifeMapClient {
    pub fn new(client: RemoteApiClient) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(RemoteApiClient::from_base_url(
            settings.require_fortune_api_base_url()?,
        )?))
    }

    pub async fn trends(&self, req: &LifeMapRequest) -> anyhow::Result<LifeMapData> {
        self.client.post_envelope("lifemap", TRENDS_PATH, req).await
    }
}
