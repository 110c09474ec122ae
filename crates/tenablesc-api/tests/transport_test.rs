#![allow(clippy::unwrap_used)]
// Integration tests for `Transport` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tenablesc_api::{
    Body, Error, HeaderSet, RequestSpec, ResponseFormat, Transport, TransportConfig,
};

async fn setup() -> (MockServer, Transport) {
    let server = MockServer::start().await;
    let transport = Transport::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, transport)
}

// ── Construction ────────────────────────────────────────────────────

#[test]
fn test_invalid_endpoints_rejected() {
    for uri in ["", "ness.us", "localhost:1443"] {
        let result = Transport::new(uri, &TransportConfig::default());
        assert!(
            matches!(result, Err(Error::InvalidEndpoint { .. })),
            "{uri:?} should be rejected"
        );
    }
}

#[test]
fn test_url_reads_back_normalized() {
    let transport = Transport::new("http://ness.us/", &TransportConfig::default()).unwrap();
    assert_eq!(transport.url(), "http://ness.us/");
    assert!(transport.verifies_peer());
}

// ── Response formats ────────────────────────────────────────────────

#[tokio::test]
async fn test_json_format_parses_body() {
    let (server, transport) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/thing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a":1}"#))
        .mount(&server)
        .await;

    let reply = transport
        .get(RequestSpec::new("/rest/thing").json())
        .await
        .unwrap();

    assert!(reply.is_ok());
    assert_eq!(reply.body, Body::Json(json!({ "a": 1 })));
}

#[tokio::test]
async fn test_raw_format_returns_text() {
    let (server, transport) = setup().await;
    Mock::given(method("POST"))
        .and(path("/rest/thing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a":1}"#))
        .mount(&server)
        .await;

    let reply = transport.post(RequestSpec::new("/rest/thing")).await.unwrap();

    assert_eq!(reply.body, Body::Raw(r#"{"a":1}"#.into()));
}

#[tokio::test]
async fn test_json_parse_failure_falls_back_to_raw() {
    let (server, transport) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("RESPONSE_BODY"))
        .mount(&server)
        .await;

    let reply = transport
        .get(RequestSpec {
            path: "path".into(),
            query: Some("query".into()),
            payload: Some(json!("payload")),
            headers: None,
            format: ResponseFormat::Json,
        })
        .await
        .unwrap();

    assert_eq!(reply.body, Body::Raw("RESPONSE_BODY".into()));
}

#[tokio::test]
async fn test_empty_json_body_is_null() {
    let (server, transport) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let reply = transport.get(RequestSpec::new("/").json()).await.unwrap();

    assert_eq!(reply.body, Body::Json(serde_json::Value::Null));
}

// ── Request shaping ─────────────────────────────────────────────────

#[tokio::test]
async fn test_payload_sent_as_json_with_headers_and_query() {
    let (server, transport) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/rest/thing/1"))
        .and(query_param("fields", "id,name"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "key": "data" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let headers = HeaderSet::with_defaults();
    let reply = transport
        .put(
            RequestSpec::new("/rest/thing/1")
                .query("fields=id,name")
                .payload(json!({ "key": "data" }))
                .headers(&headers)
                .json(),
        )
        .await
        .unwrap();

    assert_eq!(reply.body.as_json(), Some(&json!({ "ok": true })));
}

#[tokio::test]
async fn test_missing_payload_sends_empty_body() {
    let (server, transport) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/token"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let reply = transport.delete(RequestSpec::new("/rest/token")).await.unwrap();

    assert_eq!(reply.status.as_u16(), 204);
    assert!(!reply.is_ok());
}

#[tokio::test]
async fn test_set_cookie_values_collected_in_order() {
    let (server, transport) = setup().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "a=1; path=/")
                .append_header("set-cookie", "TNS_SESSIONID=abc; path=/; secure"),
        )
        .mount(&server)
        .await;

    let reply = transport.post(RequestSpec::new("/rest/token")).await.unwrap();

    assert_eq!(
        reply.cookies,
        vec![
            "a=1; path=/".to_string(),
            "TNS_SESSIONID=abc; path=/; secure".to_string()
        ]
    );
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let transport = Transport::new("http://127.0.0.1:1/", &TransportConfig::default()).unwrap();

    let result = transport.get(RequestSpec::new("/").json()).await;

    match result {
        Err(ref err @ Error::Transport(_)) => assert!(err.is_transient()),
        other => panic!("expected Transport error, got: {other:?}"),
    }
}
