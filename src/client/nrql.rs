//! NRQL query execution over NerdGraph.

use serde_json::json;

use crate::client::Client;
use crate::client::types::NrqlResult;
use crate::error::Result;
use crate::tree::{as_object, list_at, object_at};

const NRQL_QUERY: &str = r#"
query($accountId: Int!, $nrql: Nrql!) {
    actor {
        account(id: $accountId) {
            nrql(query: $nrql) {
                results
            }
        }
    }
}"#;

impl Client {
    /// Runs an NRQL query. Rows come back in source order with their native
    /// JSON scalar typing; a non-object row keeps its slot as an empty row.
    pub async fn query_nrql(&self, nrql: &str) -> Result<NrqlResult> {
        let account_id = self.account_id_int()?;
        let data = self
            .nerdgraph(
                NRQL_QUERY,
                Some(json!({ "accountId": account_id, "nrql": nrql })),
            )
            .await?;

        let actor = object_at(&data, "actor")?;
        let account = object_at(actor, "account")?;
        let nrql_payload = object_at(account, "nrql")?;
        let rows = list_at(nrql_payload, "results")?;

        let results = rows
            .iter()
            .map(|row| as_object(row).cloned().unwrap_or_default())
            .collect();

        Ok(NrqlResult { results })
    }
}
