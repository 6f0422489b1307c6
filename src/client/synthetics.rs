//! Synthetic monitor operations, served from the synthetics base URL.

use reqwest::Method;
use serde::Deserialize;

use crate::client::Client;
use crate::client::types::SyntheticMonitor;
use crate::error::Result;

#[derive(Deserialize)]
struct SyntheticsResponse {
    #[serde(default)]
    monitors: Vec<SyntheticMonitor>,
}

impl Client {
    pub async fn list_synthetic_monitors(&self) -> Result<Vec<SyntheticMonitor>> {
        let url = self.synthetics_url("/monitors.json");
        let bytes = self.request(Method::GET, &url, None).await?;
        let response: SyntheticsResponse = serde_json::from_slice(&bytes)?;
        Ok(response.monitors)
    }

    pub async fn get_synthetic_monitor(&self, monitor_id: &str) -> Result<SyntheticMonitor> {
        let url = self.synthetics_url(&format!("/monitors/{monitor_id}"));
        let bytes = self.request(Method::GET, &url, None).await?;
        let monitor: SyntheticMonitor = serde_json::from_slice(&bytes)?;
        Ok(monitor)
    }
}
