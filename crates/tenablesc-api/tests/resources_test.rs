#![allow(clippy::unwrap_used)]
// Integration tests for the resource helpers using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tenablesc_api::{ClientConfig, Error, SourceType, TenablescClient};

const API_KEY_HEADER: &str = "accesskey=ak; secretkey=sk;";

// ── Helpers ─────────────────────────────────────────────────────────

/// Key-authenticated client against a fresh mock server.
async fn setup() -> (MockServer, TenablescClient) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "regular",
            "response": {
                "jobd": "Running",
                "zones": [{ "id": "1", "name": "Default", "status": "1" }]
            },
            "error_code": 0
        })))
        .mount(&server)
        .await;

    let secret: SecretString = "sk".to_string().into();
    let config = ClientConfig::new(server.uri()).api_keys("ak", secret);
    let client = TenablescClient::connect(config).await.unwrap();
    (server, client)
}

fn envelope(response: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "type": "regular",
        "response": response,
        "error_code": 0,
        "error_msg": ""
    }))
}

async fn mount_queries(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/query"))
        .respond_with(envelope(json!({
            "usable": [
                { "id": "7", "name": "Critical" },
                { "id": "12", "name": "Exploitable" }
            ],
            "manageable": []
        })))
        .mount(server)
        .await;
}

// ── Assets ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_asset_by_ip() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/search/hostAsset"))
        .and(query_param("type", "ipAddress"))
        .and(query_param("query", "10.0.0.5"))
        .and(query_param("limit", "20"))
        .and(header("x-apikey", API_KEY_HEADER))
        .respond_with(envelope(json!({
            "count": "1",
            "results": [{ "ipAddress": "10.0.0.5", "uuid": "host-uuid" }]
        })))
        .mount(&server)
        .await;

    let found = client.assets().search_by_ip("10.0.0.5", 20).await.unwrap();

    assert_eq!(found["count"], "1");
    assert_eq!(found["results"][0]["uuid"], "host-uuid");
}

#[tokio::test]
async fn test_asset_info_by_ip_follows_matching_result() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/search/hostAsset"))
        .respond_with(envelope(json!({
            "count": 2,
            "results": [
                { "ipAddress": "10.0.0.50", "uuid": "other" },
                { "ipAddress": "10.0.0.5", "uuid": "host-uuid" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/search/hostAsset/details"))
        .and(query_param("hostUUID", "other"))
        .and(query_param("saveHistory", "true"))
        .respond_with(envelope(json!({ "uuid": "other", "os": "Linux" })))
        .expect(1)
        .mount(&server)
        .await;

    // "10.0.0.50" contains "10.0.0.5", so the first result wins.
    let info = client.assets().info_by_ip("10.0.0.5").await.unwrap();

    assert_eq!(info, json!({ "uuid": "other", "os": "Linux" }));
}

#[tokio::test]
async fn test_asset_info_by_ip_returns_empty_search() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/search/hostAsset"))
        .respond_with(envelope(json!({ "count": 0, "results": [] })))
        .mount(&server)
        .await;

    let info = client.assets().info_by_ip("192.0.2.1").await.unwrap();

    assert_eq!(info, json!({ "count": 0, "results": [] }));
}

#[tokio::test]
async fn test_asset_info_by_ip_without_match_returns_results() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/search/hostAsset"))
        .respond_with(envelope(json!({
            "count": 1,
            "results": [{ "ipAddress": "10.9.9.9", "uuid": "elsewhere" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/search/hostAsset/details"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let info = client.assets().info_by_ip("10.0.0.5").await.unwrap();

    assert_eq!(info, json!([{ "ipAddress": "10.9.9.9", "uuid": "elsewhere" }]));
}

#[tokio::test]
async fn test_vulns_by_asset_ip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/analysis"))
        .and(body_json(json!({
            "query": {
                "tool": "vulndetails",
                "type": "vuln",
                "filters": [{ "filterName": "ip", "operator": "=", "value": "10.0.0.5" }],
                "sourceType": "cumulative",
                "startOffset": 5,
                "endOffset": 15
            },
            "type": "vuln",
            "sourceType": "cumulative"
        })))
        .respond_with(envelope(json!({ "totalRecords": "1", "results": [{ "pluginID": "19506" }] })))
        .expect(1)
        .mount(&server)
        .await;

    let vulns = client
        .assets()
        .vulns_by_ip("10.0.0.5", 5, 10, SourceType::Cumulative)
        .await
        .unwrap();

    assert_eq!(vulns["results"][0]["pluginID"], "19506");
}

// ── Queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_id_by_name() {
    let (server, client) = setup().await;
    mount_queries(&server).await;

    let queries = client.queries();
    assert_eq!(queries.id_by_name("Exploitable").await.unwrap().as_deref(), Some("12"));
    assert_eq!(queries.id_by_name("Missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_vulns_by_query_name() {
    let (server, client) = setup().await;
    mount_queries(&server).await;

    let filters = json!([{ "filterName": "severity", "operator": "=", "value": "4" }]);
    Mock::given(method("GET"))
        .and(path("/rest/query/12"))
        .respond_with(envelope(json!({
            "id": "12",
            "name": "Exploitable",
            "tool": "vulndetails",
            "type": "vuln",
            "filters": filters
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/analysis"))
        .and(body_json(json!({
            "query": {
                "name": "Exploitable",
                "tool": "vulndetails",
                "type": "vuln",
                "filters": filters,
                "sourceType": "patched",
                "startOffset": 0,
                "endOffset": 50
            },
            "type": "vuln",
            "sourceType": "patched"
        })))
        .respond_with(envelope(json!({ "totalRecords": "0", "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .queries()
        .vulns_by_name("Exploitable", 0, 50, SourceType::Patched)
        .await
        .unwrap();

    assert_eq!(result["totalRecords"], "0");
}

#[tokio::test]
async fn test_vulns_by_unknown_query_name() {
    let (server, client) = setup().await;
    mount_queries(&server).await;

    let result = client
        .queries()
        .vulns_by_name("Nope", 0, 50, SourceType::default())
        .await;

    assert!(matches!(result, Err(Error::QueryNotFound { ref name }) if name == "Nope"));
}

// ── Scans / server ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_scans() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/scanResult"))
        .respond_with(envelope(json!({
            "usable": [{ "id": "3", "name": "Weekly", "status": "Completed" }]
        })))
        .mount(&server)
        .await;

    let scans = client.scans().list().await.unwrap();

    assert_eq!(scans["usable"][0]["status"], "Completed");
}

#[tokio::test]
async fn test_server_and_scanner_status() {
    let (_server, client) = setup().await;

    let status = client.server().status().await.unwrap();
    assert_eq!(status["response"]["jobd"], "Running");

    let zones = client.server().scanner_status().await.unwrap();
    assert_eq!(zones, json!([{ "id": "1", "name": "Default", "status": "1" }]));
}

#[tokio::test]
async fn test_non_json_resource_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/scanResult"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client.scans().list().await;

    match result {
        Err(Error::UnexpectedBody { ref path, ref body }) => {
            assert_eq!(path, "/rest/scanResult");
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected UnexpectedBody, got: {other:?}"),
    }
}
