#![allow(dead_code)]

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use newrelic_cli::client::{Client, ClientConfig};
use newrelic_cli::identifiers::{AccountId, Region};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const TEST_ACCOUNT_ID: &str = "1234567";
pub const TEST_API_KEY: &str = "NRAK-TESTTESTTESTTEST";

/// A client with every base URL pointed at the mock server.
pub fn test_client(server: &MockServer) -> Client {
    client_with_account(server, TEST_ACCOUNT_ID)
}

pub fn client_without_account(server: &MockServer) -> Client {
    client_with_account(server, "")
}

fn client_with_account(server: &MockServer, account_id: &str) -> Client {
    let config = ClientConfig {
        api_key: TEST_API_KEY.to_string(),
        account_id: AccountId::new(account_id),
        region: Region::Us,
        timeout: Duration::from_secs(5),
    };
    Client::new(config)
        .expect("client should build")
        .with_base_url(&server.uri())
}

/// Wraps a GraphQL `data` payload in the response envelope.
pub fn graphql_data(data: Value) -> Value {
    json!({ "data": data })
}

/// Builds an entity GUID the way the platform does: base64 over
/// `account|domain|type|id`.
pub fn encode_guid(account: &str, domain: &str, entity_type: &str, entity_id: &str) -> String {
    STANDARD.encode(format!("{account}|{domain}|{entity_type}|{entity_id}"))
}
