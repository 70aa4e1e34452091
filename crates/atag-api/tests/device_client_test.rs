#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atag_api::{AccStatus, DeviceClient, Error, HostIdentity, InfoFlags};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url,
        HostIdentity::new("01:23:45:67:89:ab", "atag-test"),
    );
    (server, client)
}

// ── Retrieve ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_retrieve_success() {
    let (server, client) = setup().await;

    let reply = json!({
        "retrieve_reply": {
            "seqnr": 0,
            "acc_status": 2,
            "status": { "device_id": "6808-1234-5678_15-30-001-123" },
            "report": {
                "room_temp": 19.5,
                "outside_temp": 7.2,
                "boiler_status": 8,
                "ch_water_pres": 1.8
            },
            "control": { "ch_mode_temp": 20.0 }
        }
    });

    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "retrieve_message": {
                "info": 9,
                "account_auth": { "mac_address": "01:23:45:67:89:ab" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
        .mount(&server)
        .await;

    let reply = client.retrieve(InfoFlags::default()).await.unwrap();

    assert_eq!(reply.acc_status(), Some(AccStatus::Authorized));
    let report = reply.report.unwrap();
    assert_eq!(report.room_temp, Some(19.5));
    assert_eq!(report.outside_temp, Some(7.2));
    assert_eq!(report.ch_water_pres, Some(1.8));
    assert_eq!(reply.control.unwrap().ch_mode_temp, Some(20.0));
}

#[tokio::test]
async fn test_retrieve_sequence_numbers_increase() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retrieve_reply": { "acc_status": 2, "report": {}, "control": {} }
        })))
        .mount(&server)
        .await;

    client.retrieve(InfoFlags::default()).await.unwrap();
    client.retrieve(InfoFlags::default()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let seq: Vec<i64> = requests
        .iter()
        .map(|r| r.body_json::<serde_json::Value>().unwrap()["retrieve_message"]["seqnr"]
            .as_i64()
            .unwrap())
        .collect();
    assert_eq!(seq, vec![0, 1]);
}

// ── Pair ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pair_pending_then_denied() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pair"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pair_reply": { "seqnr": 0, "acc_status": 1, "status": {} }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/pair"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pair_reply": { "seqnr": 1, "acc_status": 3, "status": {} }
        })))
        .mount(&server)
        .await;

    assert_eq!(client.pair().await.unwrap().acc_status(), Some(AccStatus::Pending));
    assert_eq!(client.pair().await.unwrap().acc_status(), Some(AccStatus::Denied));
}

#[tokio::test]
async fn test_pair_request_carries_account_entry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pair"))
        .and(body_partial_json(json!({
            "pair_message": {
                "accounts": {
                    "entries": [{
                        "mac_address": "01:23:45:67:89:ab",
                        "device_name": "atag-test",
                        "account_type": 0
                    }]
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pair_reply": { "acc_status": 2, "status": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.pair().await.unwrap();
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_acknowledged() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/update"))
        .and(body_partial_json(json!({
            "update_message": { "control": { "ch_mode_temp": 21.5 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "update_reply": { "seqnr": 0, "acc_status": 2, "status": {} }
        })))
        .mount(&server)
        .await;

    let reply = client.update(21.5).await.unwrap();
    assert!(reply.acknowledged());
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_200_is_device_status_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let err = client.retrieve(InfoFlags::default()).await.unwrap_err();
    match err {
        Error::DeviceStatus { status, ref body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("expected DeviceStatus error, got: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_protocol_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let err = client.retrieve(InfoFlags::default()).await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }));
}

#[tokio::test]
async fn test_wrong_envelope_kind_is_protocol_error() {
    let (server, client) = setup().await;

    // Device answers an update request with a retrieve reply.
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retrieve_reply": { "acc_status": 2 }
        })))
        .mount(&server)
        .await;

    let err = client.update(20.0).await.unwrap_err();
    match err {
        Error::Protocol { ref message, .. } => {
            assert!(message.contains("update_reply"), "got: {message}");
        }
        other => panic!("expected Protocol error, got: {other:?}"),
    }
}
