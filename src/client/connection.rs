//! Connection probe behind `ping`. Failures are recorded in the result rather
//! than propagated, so a bad key still produces a report.

use serde::Serialize;
use serde_json::json;

use crate::client::Client;
use crate::error::Result;
use crate::tree::{as_object, int_of, string_of};

const WHOAMI_QUERY: &str = r#"
query {
    actor {
        user {
            id
            email
        }
    }
}"#;

const ACCOUNT_PROBE_QUERY: &str = r#"
query($accountId: Int!) {
    actor {
        account(id: $accountId) {
            id
            name
        }
    }
}"#;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionTestResult {
    pub api_key_valid: bool,
    pub account_access: bool,
    pub account_id: i64,
    pub account_name: String,
    pub user_id: String,
    pub user_email: String,
    pub region: String,
    pub nerdgraph_url: String,
    pub error_message: String,
}

impl Client {
    /// Verifies the API key with an `actor.user` query, then checks account
    /// access when an account ID is configured. Probe failures end up in
    /// `error_message`; only the report itself is fallible.
    pub async fn test_connection(&self) -> Result<ConnectionTestResult> {
        let mut result = ConnectionTestResult {
            region: self.region().to_string(),
            nerdgraph_url: self.nerdgraph_endpoint().to_string(),
            ..Default::default()
        };

        let data = match self.nerdgraph(WHOAMI_QUERY, None).await {
            Ok(data) => data,
            Err(err) => {
                result.error_message = format!("API key validation failed: {err}");
                return Ok(result);
            }
        };

        result.api_key_valid = true;
        if let Some(actor) = data.get("actor").and_then(as_object)
            && let Some(user) = actor.get("user").and_then(as_object)
        {
            result.user_id = string_of(user, "id");
            result.user_email = string_of(user, "email");
        }

        if self.account_id().is_empty() {
            return Ok(result);
        }

        let account_id = match self.account_id().as_int() {
            Ok(id) => id,
            Err(err) => {
                result.error_message = format!("Account access failed: {err}");
                return Ok(result);
            }
        };

        let account_data = match self
            .nerdgraph(ACCOUNT_PROBE_QUERY, Some(json!({ "accountId": account_id })))
            .await
        {
            Ok(data) => data,
            Err(err) => {
                result.error_message = format!("Account access failed: {err}");
                return Ok(result);
            }
        };

        if let Some(actor) = account_data.get("actor").and_then(as_object)
            && let Some(account) = actor.get("account").and_then(as_object)
        {
            result.account_access = true;
            result.account_id = int_of(account, "id");
            result.account_name = string_of(account, "name");
        }

        Ok(result)
    }
}
