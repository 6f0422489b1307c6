//! Deployment markers over the REST v2 API.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::Client;
use crate::client::types::{Deployment, NewDeployment};
use crate::error::Result;
use crate::time::filter_deployments_by_time;

#[derive(Deserialize)]
struct DeploymentsResponse {
    #[serde(default)]
    deployments: Vec<Deployment>,
}

#[derive(Deserialize)]
struct DeploymentResponse {
    #[serde(default)]
    deployment: Deployment,
}

impl Client {
    pub async fn list_deployments(&self, app_id: &str) -> Result<Vec<Deployment>> {
        let url = self.rest_url(&format!("/applications/{app_id}/deployments.json"));
        let bytes = self.request(Method::GET, &url, None).await?;
        let response: DeploymentsResponse = serde_json::from_slice(&bytes)?;
        Ok(response.deployments)
    }

    /// Lists deployments restricted to an optional time range. Bounds are
    /// inclusive; records with unparseable timestamps are kept.
    pub async fn list_deployments_between(
        &self,
        app_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Deployment>> {
        let deployments = self.list_deployments(app_id).await?;
        Ok(filter_deployments_by_time(deployments, since, until))
    }

    pub async fn create_deployment(
        &self,
        app_id: &str,
        new: NewDeployment,
    ) -> Result<Deployment> {
        let mut deployment = json!({ "revision": new.revision });
        let fields = [
            ("description", new.description),
            ("user", new.user),
            ("changelog", new.changelog),
        ];
        for (key, value) in fields {
            if !value.is_empty() {
                deployment[key] = Value::String(value);
            }
        }

        let url = self.rest_url(&format!("/applications/{app_id}/deployments.json"));
        let body = json!({ "deployment": deployment });
        let bytes = self.request(Method::POST, &url, Some(&body)).await?;
        let response: DeploymentResponse = serde_json::from_slice(&bytes)?;
        Ok(response.deployment)
    }
}
