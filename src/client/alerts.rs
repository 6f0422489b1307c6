//! Alert policy operations: list over REST v2, single-policy get over
//! NerdGraph.

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::client::Client;
use crate::client::types::AlertPolicy;
use crate::error::{Error, Result};
use crate::tree::{int_of, object_at, string_of};

#[derive(Deserialize)]
struct AlertPoliciesResponse {
    #[serde(default)]
    policies: Vec<AlertPolicy>,
}

const GET_POLICY_QUERY: &str = r#"
query($accountId: Int!, $policyId: ID!) {
    actor {
        account(id: $accountId) {
            alerts {
                policy(id: $policyId) {
                    id
                    name
                    incidentPreference
                }
            }
        }
    }
}"#;

impl Client {
    pub async fn list_alert_policies(&self) -> Result<Vec<AlertPolicy>> {
        let bytes = self
            .request(Method::GET, &self.rest_url("/alerts_policies.json"), None)
            .await?;
        let response: AlertPoliciesResponse = serde_json::from_slice(&bytes)?;
        Ok(response.policies)
    }

    pub async fn get_alert_policy(&self, policy_id: &str) -> Result<AlertPolicy> {
        let account_id = self.account_id_int()?;
        let data = self
            .nerdgraph(
                GET_POLICY_QUERY,
                Some(json!({ "accountId": account_id, "policyId": policy_id })),
            )
            .await?;

        let actor = object_at(&data, "actor")?;
        let account = object_at(actor, "account")?;
        let alerts = object_at(account, "alerts")?;
        let policy = match object_at(alerts, "policy") {
            Ok(policy) => policy,
            Err(_) => return Err(Error::NotFound("alert policy not found".to_string())),
        };

        Ok(AlertPolicy {
            id: int_of(policy, "id"),
            name: string_of(policy, "name"),
            incident_preference: string_of(policy, "incidentPreference"),
        })
    }
}
