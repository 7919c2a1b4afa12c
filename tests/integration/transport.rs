//! HTTP transport and BigQuery REST table against a mock server

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, Method};
use rc_relay::config::{TableRef, TransportConfig};
use rc_relay::dispatcher::Relay;
use rc_relay::host::{MemoryCookieJar, RuntimeMode};
use rc_relay::logger::{
    AnalyticalTable, BigQueryRestTable, ConsoleSink, InsertOptions, MemoryConsole, SinkChain,
};
use rc_relay::transport::{HttpTransport, ReqwestTransport, TransportError};
use rc_relay::Outcome;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::helpers::conversion_config;

fn transport_config(server: &MockServer) -> TransportConfig {
    TransportConfig {
        conversion_endpoint: format!("{}/api/v1/conversion.php", server.uri()),
        timeout: Some(Duration::from_secs(5)),
        bigquery_api_base: server.uri(),
        bigquery_access_token: Some("token-1".to_string()),
    }
}

fn table() -> TableRef {
    TableRef {
        project_id: Some("proj".into()),
        dataset_id: Some("ds".into()),
        table_id: Some("logs".into()),
    }
}

#[tokio::test]
async fn test_reqwest_transport_returns_status_headers_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/conversion.php"))
        .and(query_param("api_key", "K"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-request-id", "abc")
                .set_body_string("accepted"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(&transport_config(&server)).unwrap();
    let resp = transport
        .send(
            &format!("{}/api/v1/conversion.php?api_key=K", server.uri()),
            Method::GET,
        )
        .await
        .unwrap();

    assert_eq!(resp.status, 201);
    assert_eq!(resp.headers.get("x-request-id").map(String::as_str), Some("abc"));
    assert_eq!(resp.body_text(), "accepted");
}

#[tokio::test]
async fn test_reqwest_transport_connect_error() {
    let transport = ReqwestTransport::new(&TransportConfig {
        timeout: Some(Duration::from_millis(500)),
        ..TransportConfig::default()
    })
    .unwrap();

    let err = transport
        .send("http://127.0.0.1:1/unreachable", Method::GET)
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Request(_)));
}

#[tokio::test]
async fn test_relay_against_mock_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/conversion.php"))
        .and(query_param("api_key", "K"))
        .and(query_param("rc_uuid", "C"))
        .and(query_param("amount", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let config = transport_config(&server);
    let console = Arc::new(MemoryConsole::new());
    let relay = Relay::new(
        Arc::new(ReqwestTransport::new(&config).unwrap()),
        SinkChain::new().add(ConsoleSink::new(console.clone())),
    )
    .with_endpoint(&config.conversion_endpoint);

    let outcome = relay
        .handle_json(
            conversion_config(false),
            json!({}),
            &HeaderMap::new(),
            &MemoryCookieJar::new(),
            RuntimeMode::LIVE,
        )
        .unwrap()
        .finish()
        .await;

    assert_eq!(outcome, Some(Outcome::Success));
    let lines = console.lines();
    let response: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(response["ResponseStatusCode"], 200);
    assert_eq!(response["ResponseBody"], "ok");
}

#[tokio::test]
async fn test_relay_transport_error_is_failure() {
    let config = TransportConfig {
        conversion_endpoint: "http://127.0.0.1:1/conversion.php".to_string(),
        timeout: Some(Duration::from_millis(500)),
        ..TransportConfig::default()
    };
    let console = Arc::new(MemoryConsole::new());
    let relay = Relay::new(
        Arc::new(ReqwestTransport::new(&config).unwrap()),
        SinkChain::new().add(ConsoleSink::new(console.clone())),
    )
    .with_endpoint(&config.conversion_endpoint);

    let outcome = relay
        .handle_json(
            conversion_config(false),
            json!({}),
            &HeaderMap::new(),
            &MemoryCookieJar::new(),
            RuntimeMode::LIVE,
        )
        .unwrap()
        .finish()
        .await;

    assert_eq!(outcome, Some(Outcome::Failure));
    let response: serde_json::Value = serde_json::from_str(&console.lines()[1]).unwrap();
    assert_eq!(response["ResponseStatusCode"], 0);
}

#[tokio::test]
async fn test_bigquery_insert_all_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/datasets/ds/tables/logs/insertAll"))
        .and(header("authorization", "Bearer token-1"))
        .and(body_partial_json(json!({"ignoreUnknownValues": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"kind": "bigquery#tableDataInsertAllResponse"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rest = BigQueryRestTable::new(&transport_config(&server)).unwrap();
    let mut row = serde_json::Map::new();
    row.insert("tag_name".into(), json!("RevContent"));

    rest.insert_rows(&table(), vec![row], InsertOptions::default())
        .await
        .unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["json"]["tag_name"], "RevContent");
    assert_eq!(rows[0]["insertId"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_bigquery_insert_errors_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "insertErrors": [{"index": 0, "errors": [{"reason": "invalid"}]}]
        })))
        .mount(&server)
        .await;

    let rest = BigQueryRestTable::new(&transport_config(&server)).unwrap();
    let result = rest
        .insert_rows(&table(), vec![serde_json::Map::new()], InsertOptions::default())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_bigquery_http_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let rest = BigQueryRestTable::new(&transport_config(&server)).unwrap();
    let err = rest
        .insert_rows(&table(), vec![serde_json::Map::new()], InsertOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn test_bigquery_background_insert() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/datasets/ds/tables/logs/insertAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let rest = BigQueryRestTable::new(&transport_config(&server)).unwrap();
    rest.insert(&table(), vec![serde_json::Map::new()], InsertOptions::default())
        .unwrap();

    for _ in 0..50 {
        if !server.received_requests().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
