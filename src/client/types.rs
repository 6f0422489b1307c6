//! Domain records constructed from API responses. Every field defaults to its
//! zero value when absent; there is no required-field enforcement at parse
//! time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::EntityGuid;

/// An APM application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Application {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub health_status: String,
    #[serde(default)]
    pub reporting: bool,
    #[serde(default)]
    pub last_reported_at: String,
}

/// A named application metric and its value selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Metric {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlertPolicy {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub incident_preference: String,
}

/// A dashboard as returned by entity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dashboard {
    #[serde(default)]
    pub guid: EntityGuid,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "accountId")]
    pub account_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardPage {
    #[serde(default)]
    pub guid: EntityGuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<DashboardWidget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardWidget {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub visualization: Map<String, Value>,
    #[serde(default, rename = "rawConfiguration")]
    pub configuration: Map<String, Value>,
}

/// Full dashboard detail, pages and widgets included. Pages own their widgets
/// by value; nothing is shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardDetail {
    #[serde(default)]
    pub guid: EntityGuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: String,
    #[serde(default)]
    pub pages: Vec<DashboardPage>,
}

/// Caller-supplied input for dashboard create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub permissions: String,
    #[serde(default)]
    pub pages: Vec<DashboardPageInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardPageInput {
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<DashboardWidgetInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardWidgetInput {
    pub title: String,
    #[serde(default)]
    pub visualization: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Map<String, Value>>,
    #[serde(default, rename = "rawConfiguration")]
    pub configuration: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "type")]
    pub user_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub authentication_domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Entity {
    #[serde(default)]
    pub guid: EntityGuid,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub entity_kind: String,
    #[serde(default, rename = "entityType")]
    pub entity_type: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default, rename = "accountId")]
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SyntheticMonitor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub monitor_type: String,
    #[serde(default)]
    pub frequency: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

/// A deployment marker. The timestamp stays a string; parsing happens only in
/// the time-range filter, which is deliberately fail-open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Deployment {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub revision: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Optional fields for a new deployment marker; empty strings are omitted
/// from the request body.
#[derive(Debug, Clone, Default)]
pub struct NewDeployment {
    pub revision: String,
    pub description: String,
    pub user: String,
    pub changelog: String,
}

/// Rows of an NRQL query, source order preserved, values kept in their native
/// JSON scalar typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NrqlResult {
    pub results: Vec<Map<String, Value>>,
}

/// An API access key. User and ingest keys share this record; `ingest_type`
/// is populated only for ingest keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ApiAccessKey {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, rename = "ingestType", skip_serializing_if = "String::is_empty")]
    pub ingest_type: String,
}

/// Partial patch for an API key update; unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiAccessKeyUpdate {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LogParsingRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub grok: String,
    #[serde(default)]
    pub lucene: String,
    #[serde(default)]
    pub nrql: String,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: String,
}

/// Partial patch for the fetch-merge-write rule update; unset fields keep the
/// values read from the server.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogParsingRuleUpdate {
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub grok: Option<String>,
    pub lucene: Option<String>,
    pub nrql: Option<String>,
}
