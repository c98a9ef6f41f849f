//! Telegram notifier against a mocked Bot API

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockwatch::config::TelegramConfig;
use stockwatch::error::NotifyError;
use stockwatch::services::notifier::{self, Notifier, TelegramNotifier};

fn config(api_url: String) -> TelegramConfig {
    TelegramConfig {
        bot_token: "123:TEST".to_string(),
        chat_id: "-100200".to_string(),
        api_url,
    }
}

#[tokio::test]
async fn posts_html_message_to_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:TEST/sendMessage"))
        .and(body_json(json!({
            "chat_id": "-100200",
            "text": "<b>hello</b>",
            "parse_mode": "HTML"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(config(server.uri()));
    assert_ok!(notifier.send("<b>hello</b>").await);
}

#[tokio::test]
async fn rejected_message_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(config(server.uri()));
    let err = notifier.send("hello").await.unwrap_err();

    match err {
        NotifyError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("chat not found"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_api_is_transport_error() {
    let notifier = TelegramNotifier::new(config("http://127.0.0.1:1".to_string()));
    let err = notifier.send("hello").await.unwrap_err();
    assert!(matches!(err, NotifyError::Transport(_)));
}

#[tokio::test]
async fn missing_credentials_disable_notifications() {
    let notifier = notifier::from_config(None);
    let err = assert_err!(notifier.send("hello").await);
    assert!(matches!(err, NotifyError::NotConfigured));
}
