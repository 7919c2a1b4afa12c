//! End-to-end pipeline scenarios

use std::time::Duration;

use rc_relay::host::RuntimeMode;
use rc_relay::transport::StubTransport;
use rc_relay::Outcome;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_consent_not_required_proceeds() {
    let t = TestRelay::with_status(200);

    let config = json!({"type": "page_view", "adStorageConsent": "optional"});
    let event = json!({
        "page_location": "https://x.com/?rc_uuid=abc123",
        "consent_state": {"ad_storage": false}
    });

    let outcome = t.handle(config, event).finish().await;

    assert_eq!(outcome, Some(Outcome::Success));
    assert_eq!(t.cookies.find("rc_uuid").unwrap().value, "abc123");
}

#[tokio::test]
async fn test_consent_denied_is_silent_success() {
    let t = TestRelay::with_status(200);

    let mut config = conversion_config(false);
    config["adStorageConsent"] = json!("required");
    let event = json!({"consent_state": {"ad_storage": false}});

    let mut invocation = t.handle(config, event);

    assert_eq!(invocation.try_outcome(), Some(Outcome::Success));
    assert!(!invocation.is_request_pending());
    assert!(t.transport.requests().is_empty());
    assert!(t.console.lines().is_empty());
}

#[tokio::test]
async fn test_gcs_signal_grants_consent() {
    let t = TestRelay::with_status(200);

    let mut config = conversion_config(false);
    config["adStorageConsent"] = json!("required");

    let outcome = t.handle(config, json!({"x-ga-gcs": "G110"})).finish().await;

    assert_eq!(outcome, Some(Outcome::Success));
    assert_eq!(t.transport.requests().len(), 1);
}

#[tokio::test]
async fn test_page_view_sets_cookie() {
    let t = TestRelay::with_status(200);

    let outcome = t
        .handle(
            json!({"type": "page_view"}),
            json!({"page_location": "https://x.com/?rc_uuid=abc123"}),
        )
        .finish()
        .await;

    assert_eq!(outcome, Some(Outcome::Success));
    let cookie = t.cookies.find("rc_uuid").unwrap();
    assert_eq!(cookie.value, "abc123");
    assert_eq!(cookie.options.max_age, 34_560_000);
    assert_eq!(cookie.options.domain, "auto");
    assert_eq!(cookie.options.path, "/");
    assert!(cookie.options.secure);
    assert!(!cookie.client_readable);
    assert!(t.transport.requests().is_empty());
}

#[tokio::test]
async fn test_page_view_falls_back_to_referer() {
    let t = TestRelay::with_status(200).header("referer", "https://x.com/landing?rc_uuid=r1");

    let outcome = t
        .handle(json!({"type": "page_view"}), json!({}))
        .finish()
        .await;

    assert_eq!(outcome, Some(Outcome::Success));
    assert_eq!(t.cookies.find("rc_uuid").unwrap().value, "r1");
}

#[tokio::test]
async fn test_conversion_signals_after_response() {
    let (transport, release) = StubTransport::status(200).gated();
    let t = TestRelay::new(transport).header("trace-id", "trace-42");

    let mut invocation = t.handle(conversion_config(false), json!({}));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(invocation.try_outcome(), None);
    assert!(invocation.is_request_pending());

    release.release();
    assert_eq!(invocation.outcome().await, Some(Outcome::Success));

    let records = t.console_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["Type"], "Request");
    assert_eq!(records[0]["TraceId"], "trace-42");
    assert_eq!(
        records[0]["RequestUrl"],
        "https://trends.revcontent.com/api/v1/conversion.php?api_key=K&rc_uuid=C&amount=10"
    );
    assert_eq!(records[1]["Type"], "Response");
    assert_eq!(records[1]["ResponseStatusCode"], 200);
    assert_eq!(records[1]["TraceId"], "trace-42");
}

#[tokio::test]
async fn test_conversion_failure_status() {
    let t = TestRelay::with_status(503);

    let outcome = t.handle(conversion_config(false), json!({})).finish().await;

    assert_eq!(outcome, Some(Outcome::Failure));
    assert_eq!(t.console_records()[1]["ResponseStatusCode"], 503);
}

#[tokio::test]
async fn test_optimistic_signals_before_response() {
    let (transport, release) = StubTransport::status(500).gated();
    let t = TestRelay::new(transport);

    let mut invocation = t.handle(conversion_config(true), json!({}));

    // Success is already emitted while the request is held back.
    assert_eq!(invocation.try_outcome(), Some(Outcome::Success));
    assert!(invocation.is_request_pending());
    assert_eq!(t.console_records().len(), 1);

    release.release();
    let outcome = invocation.finish().await;

    assert_eq!(outcome, Some(Outcome::Success));
    let records = t.console_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["ResponseStatusCode"], 500);
}

#[tokio::test]
async fn test_optimistic_string_flag() {
    let t = TestRelay::with_status(404);

    let mut config = conversion_config(false);
    config["useOptimisticScenario"] = json!("true");

    assert_eq!(t.handle(config, json!({})).finish().await, Some(Outcome::Success));
}

#[tokio::test]
async fn test_unknown_type_fails_without_logs() {
    let t = TestRelay::with_status(200);

    let mut config = conversion_config(false);
    config["type"] = json!("unknown");

    let mut invocation = t.handle(config, json!({}));

    assert_eq!(invocation.try_outcome(), Some(Outcome::Failure));
    assert!(t.console.lines().is_empty());
    assert!(t.table.inserts().is_empty());
    assert!(t.transport.requests().is_empty());
}

#[tokio::test]
async fn test_missing_fields_fail_even_when_optimistic() {
    let t = TestRelay::with_status(200);

    let config = json!({
        "type": "conversion",
        "apiKey": "K",
        "amount": 10,
        "useOptimisticScenario": true,
        "logType": "always"
    });

    let outcome = t.handle(config, json!({})).finish().await;

    assert_eq!(outcome, Some(Outcome::Failure));
    assert!(t.transport.requests().is_empty());

    let records = t.console_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["Type"], "Message");
    assert_eq!(records[0]["Message"], "Request was not sent.");
    assert_eq!(
        records[0]["Reason"],
        "One or more required properties are missing: api_key or rc_uuid or amount"
    );
}

#[tokio::test]
async fn test_click_id_from_cookie() {
    let t = TestRelay::with_status(200).cookie("rc_uuid", "from-cookie");

    let config = json!({"type": "conversion", "apiKey": "K", "amount": "7"});
    let outcome = t
        .handle(config, json!({"ip_override": "1.2.3.4", "user_agent": "UA 1"}))
        .finish()
        .await;

    assert_eq!(outcome, Some(Outcome::Success));
    let requests = t.transport.requests();
    assert_eq!(
        requests[0].1,
        "https://trends.revcontent.com/api/v1/conversion.php?api_key=K&rc_uuid=from-cookie&amount=7&user_ip=1.2.3.4&user_agent=UA%201"
    );
}

#[tokio::test]
async fn test_preview_traffic_is_skipped() {
    let t = TestRelay::with_status(200);

    let outcome = t
        .handle(
            conversion_config(false),
            json!({"page_location": "https://gtm-msr.appspot.com/render?id=GTM-1"}),
        )
        .finish()
        .await;

    assert_eq!(outcome, Some(Outcome::Success));
    assert!(t.transport.requests().is_empty());
    assert!(t.console.lines().is_empty());
}

#[tokio::test]
async fn test_console_follows_debug_mode() {
    let mut config = conversion_config(false);
    config.as_object_mut().unwrap().remove("logType");

    let live = TestRelay::with_status(200);
    live.handle(config.clone(), json!({})).finish().await;
    assert!(live.console.lines().is_empty());

    let preview = TestRelay::with_status(200).mode(RuntimeMode::PREVIEW);
    preview.handle(config.clone(), json!({})).finish().await;
    assert_eq!(preview.console.lines().len(), 2);

    config["logType"] = json!("no");
    let muted = TestRelay::with_status(200).mode(RuntimeMode::DEBUG);
    muted.handle(config, json!({})).finish().await;
    assert!(muted.console.lines().is_empty());
}

#[tokio::test]
async fn test_bigquery_rows() {
    let t = TestRelay::with_status(200);

    let mut config = conversion_config(false);
    config["logType"] = json!("no");
    config["bigQueryLogType"] = json!("always");
    config["logBigQueryProjectId"] = json!("proj");
    config["logBigQueryDatasetId"] = json!("ds");
    config["logBigQueryTableId"] = json!("logs");

    t.handle(config, json!({})).finish().await;

    assert!(t.console.lines().is_empty());
    let inserts = t.table.inserts();
    assert_eq!(inserts.len(), 2);
    assert_eq!(inserts[0].table.project_id.as_deref(), Some("proj"));
    assert_eq!(inserts[0].table.dataset_id.as_deref(), Some("ds"));
    assert_eq!(inserts[0].table.table_id.as_deref(), Some("logs"));
    assert!(inserts[0].options.ignore_unknown_values);

    let rows = t.table.rows();
    assert_eq!(rows[0]["tag_name"], "RevContent");
    assert_eq!(rows[0]["type"], "Request");
    assert_eq!(rows[1]["type"], "Response");
    assert_eq!(rows[1]["response_status_code"], 200);
    assert_eq!(rows[1]["response_headers"], "{}");
    assert_eq!(rows[1]["response_body"], "\"\"");
    assert!(rows[1]["timestamp"].as_u64().is_some());
}
