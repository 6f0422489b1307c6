//! The New Relic API client: REST v2, NerdGraph (GraphQL), and the
//! synthetics API, behind one credential set.

pub mod alerts;
pub mod applications;
pub mod connection;
pub mod dashboards;
pub mod deployments;
pub mod entities;
pub mod keys;
pub mod logs;
pub mod nrql;
pub mod resolve;
pub mod synthetics;
pub mod types;
pub mod users;

use std::time::Duration as StdDuration;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::identifiers::{AccountId, Region};

const USER_AGENT: &str = concat!("newrelic-cli/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Explicit construction parameters; [`crate::config::Config::client_config`]
/// produces these from the layered configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub account_id: AccountId,
    pub region: Region,
    pub timeout: StdDuration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            account_id: AccountId::default(),
            region: Region::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    account_id: AccountId,
    region: Region,
    rest_url: String,
    nerdgraph_url: String,
    synthetics_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let endpoints = config.region.endpoints();
        Ok(Self {
            http,
            api_key: config.api_key,
            account_id: config.account_id,
            region: config.region,
            rest_url: endpoints.rest.to_string(),
            nerdgraph_url: endpoints.nerdgraph.to_string(),
            synthetics_url: endpoints.synthetics.to_string(),
        })
    }

    /// Points every base URL at `base`. Test servers expose all three API
    /// surfaces behind one origin.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.rest_url = base.to_string();
        self.nerdgraph_url = format!("{base}/graphql");
        self.synthetics_url = format!("{base}/synthetics");
        self
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn nerdgraph_endpoint(&self) -> &str {
        &self.nerdgraph_url
    }

    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}{path}", self.rest_url)
    }

    pub(crate) fn synthetics_url(&self, path: &str) -> String {
        format!("{}{path}", self.synthetics_url)
    }

    pub(crate) fn require_account_id(&self) -> Result<()> {
        if self.account_id.is_empty() {
            return Err(Error::AccountIdRequired);
        }
        Ok(())
    }

    pub(crate) fn account_id_int(&self) -> Result<i64> {
        self.require_account_id()?;
        self.account_id.as_int()
    }

    /// Sends a request with the API-key header. Non-2xx responses become
    /// [`Error::Http`] carrying the status and raw body so callers can branch
    /// on not-found vs unauthorized.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>> {
        tracing::debug!(%method, url, "dispatching request");

        let mut builder = self
            .http
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.as_u16() >= 400 {
            return Err(Error::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }

    /// Executes a NerdGraph query or mutation. A non-empty top-level `errors`
    /// list is fatal for the call even when `data` is present; the first
    /// error's message is surfaced.
    pub(crate) async fn nerdgraph(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Map<String, Value>> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let bytes = self
            .request(Method::POST, &self.nerdgraph_url, Some(&body))
            .await?;
        let envelope: NerdGraphResponse = serde_json::from_slice(&bytes)?;

        if let Some(first) = envelope.errors.first() {
            return Err(Error::GraphQl(first.message.clone()));
        }

        match envelope.data {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(Error::Shape { key: "data" }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NerdGraphResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<NerdGraphError>,
}

#[derive(Debug, Deserialize)]
struct NerdGraphError {
    #[serde(default)]
    message: String,
}

/// Reads the first embedded `errors` entry of a mutation payload, if any.
/// Mutations report failures inside the payload with HTTP 200; only the first
/// entry is surfaced.
pub(crate) fn first_embedded_error(
    payload: &Map<String, Value>,
    message_keys: &[&str],
) -> Option<String> {
    let errors = payload.get("errors").and_then(Value::as_array)?;
    let first = errors.first()?;

    if let Some(first) = first.as_object() {
        for key in message_keys {
            if let Some(message) = first.get(*key).and_then(Value::as_str)
                && !message.is_empty()
            {
                return Some(message.to_string());
            }
        }
    }
    // An error was reported, but not in a shape with a usable message.
    Some("unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::first_embedded_error;

    fn payload(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn embedded_error_prefers_the_first_matching_key() {
        let payload = payload(json!({
            "errors": [{"description": "bad input", "message": "ignored"}]
        }));
        let message = first_embedded_error(&payload, &["description", "message"]);
        assert_eq!(message.as_deref(), Some("bad input"));
    }

    #[test]
    fn embedded_error_without_a_message_is_still_an_error() {
        let payload = payload(json!({ "errors": [{"code": "VALIDATION"}] }));
        let message = first_embedded_error(&payload, &["message"]);
        assert_eq!(message.as_deref(), Some("unknown error"));
    }

    #[test]
    fn non_object_embedded_error_is_still_an_error() {
        let payload = payload(json!({ "errors": ["boom"] }));
        let message = first_embedded_error(&payload, &["message"]);
        assert_eq!(message.as_deref(), Some("unknown error"));
    }

    #[test]
    fn empty_error_list_means_success() {
        let payload = payload(json!({ "errors": [] }));
        assert_eq!(first_embedded_error(&payload, &["message"]), None);
    }
}
