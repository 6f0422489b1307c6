//! APM application operations over the REST v2 API.

use reqwest::Method;
use serde::Deserialize;

use crate::client::Client;
use crate::client::types::{Application, Metric};
use crate::error::Result;

#[derive(Deserialize)]
struct ApplicationsResponse {
    #[serde(default)]
    applications: Vec<Application>,
}

#[derive(Deserialize)]
struct ApplicationResponse {
    #[serde(default)]
    application: Application,
}

#[derive(Deserialize)]
struct MetricsResponse {
    #[serde(default)]
    metrics: Vec<Metric>,
}

impl Client {
    pub async fn list_applications(&self) -> Result<Vec<Application>> {
        let bytes = self
            .request(Method::GET, &self.rest_url("/applications.json"), None)
            .await?;
        let response: ApplicationsResponse = serde_json::from_slice(&bytes)?;
        Ok(response.applications)
    }

    pub async fn get_application(&self, app_id: &str) -> Result<Application> {
        let url = self.rest_url(&format!("/applications/{app_id}.json"));
        let bytes = self.request(Method::GET, &url, None).await?;
        let response: ApplicationResponse = serde_json::from_slice(&bytes)?;
        Ok(response.application)
    }

    pub async fn list_application_metrics(&self, app_id: &str) -> Result<Vec<Metric>> {
        let url = self.rest_url(&format!("/applications/{app_id}/metrics.json"));
        let bytes = self.request(Method::GET, &url, None).await?;
        let response: MetricsResponse = serde_json::from_slice(&bytes)?;
        Ok(response.metrics)
    }
}
