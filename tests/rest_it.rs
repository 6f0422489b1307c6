mod support;

use chrono::{TimeZone, Utc};
use newrelic_cli::client::types::NewDeployment;
use newrelic_cli::error::Error;
use serde_json::json;
use support::test_client;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn applications_decode_from_the_rest_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/applications.json"))
        .and(header("Api-Key", support::TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "applications": [
                {
                    "id": 42, "name": "checkout", "language": "ruby",
                    "health_status": "green", "reporting": true,
                    "last_reported_at": "2025-06-15T20:00:00Z"
                },
                { "id": 43, "name": "bare" }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let applications = client.list_applications().await.expect("list");

    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].name, "checkout");
    assert!(applications[0].reporting);
    // Absent fields default rather than failing the decode.
    assert_eq!(applications[1].language, "");
    assert!(!applications[1].reporting);
}

#[tokio::test]
async fn http_404_branches_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/applications/999.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"error\":\"no such app\"}"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let error = client.get_application("999").await.expect_err("404");

    assert!(error.is_not_found());
    assert!(!error.is_unauthorized());
    assert!(matches!(error, Error::Http { status: 404, .. }));
}

#[tokio::test]
async fn http_401_branches_as_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts_policies.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let error = client.list_alert_policies().await.expect_err("401");

    assert!(error.is_unauthorized());
    let Error::Http { status, body } = error else {
        panic!("expected an HTTP error");
    };
    assert_eq!(status, 401);
    assert_eq!(body, "unauthorized");
}

#[tokio::test]
async fn deployment_listing_filters_by_time_but_keeps_unparseable_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/applications/42/deployments.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deployments": [
                { "id": 1, "revision": "old", "timestamp": "2025-06-01T00:00:00Z" },
                { "id": 2, "revision": "boundary", "timestamp": "2025-06-10T00:00:00Z" },
                { "id": 3, "revision": "recent", "timestamp": "2025-06-12T08:30:00Z" },
                { "id": 4, "revision": "garbled", "timestamp": "not a time" }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let since = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).single();
    let deployments = client
        .list_deployments_between("42", since, None)
        .await
        .expect("list");

    let revisions: Vec<&str> = deployments
        .iter()
        .map(|deployment| deployment.revision.as_str())
        .collect();
    assert_eq!(revisions, ["boundary", "recent", "garbled"]);
}

#[tokio::test]
async fn deployment_create_omits_empty_optional_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/applications/42/deployments.json"))
        .and(body_json(json!({
            "deployment": { "revision": "abc123", "user": "deployer" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "deployment": {
                "id": 9, "revision": "abc123", "user": "deployer",
                "timestamp": "2025-06-15T20:30:45Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let new = NewDeployment {
        revision: "abc123".to_string(),
        description: String::new(),
        user: "deployer".to_string(),
        changelog: String::new(),
    };
    let created = client.create_deployment("42", new).await.expect("create");

    assert_eq!(created.id, 9);
    assert_eq!(created.revision, "abc123");
}

#[tokio::test]
async fn synthetics_use_their_own_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/synthetics/monitors.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "monitors": [
                { "id": "m-1", "name": "homepage", "type": "SIMPLE",
                  "frequency": 15, "status": "ENABLED", "uri": "https://example.com" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/synthetics/monitors/m-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m-1", "name": "homepage", "type": "SIMPLE",
            "frequency": 15, "status": "ENABLED"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);

    let monitors = client.list_synthetic_monitors().await.expect("list");
    assert_eq!(monitors.len(), 1);
    assert_eq!(monitors[0].monitor_type, "SIMPLE");

    let monitor = client.get_synthetic_monitor("m-1").await.expect("get");
    assert_eq!(monitor.frequency, 15);
    assert_eq!(monitor.uri, "");
}
