//! Tests for the outbound webhook sender against a stand-in chat endpoint.

use std::time::Duration;

use notify_relay::notifications::models::NotifyRequest;
use notify_relay::notifications::senders::webhook::WebhookSender;
use notify_relay::notifications::senders::{NotificationSender, SenderError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_json_with_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/T000/B000"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"text": "*alice* : hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let sender = WebhookSender::new(Duration::from_secs(5)).expect("sender");
    let url = format!("{}/services/T000/B000", server.uri());

    sender
        .send(&url, &NotifyRequest::from_text("*alice* : hi"))
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no_service"))
        .expect(1)
        .mount(&server)
        .await;

    let sender = WebhookSender::new(Duration::from_secs(5)).expect("sender");
    let err = sender
        .send(&server.uri(), &NotifyRequest::from_text("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, SenderError::Rejected(404)), "got {err:?}");
}

#[tokio::test]
async fn slow_endpoint_times_out_as_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let sender = WebhookSender::new(Duration::from_millis(200)).expect("sender");
    let err = sender
        .send(&server.uri(), &NotifyRequest::from_text("hi"))
        .await
        .unwrap_err();

    match err {
        SenderError::Unreachable(reason) => assert!(reason.contains("no response within")),
        other => panic!("expected Unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn closed_port_is_unreachable_and_hides_the_url() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let sender = WebhookSender::new(Duration::from_secs(2)).expect("sender");
    let url = format!("http://127.0.0.1:{port}/services/very-secret-path");
    let err = sender
        .send(&url, &NotifyRequest::from_text("hi"))
        .await
        .unwrap_err();

    match err {
        SenderError::Unreachable(reason) => assert!(!reason.contains("very-secret-path")),
        other => panic!("expected Unreachable, got {other:?}"),
    }
}
