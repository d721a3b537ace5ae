#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Feed and Telegram adapters against mock HTTP servers, plus full cycles
//! wired the same way the service binary wires them.

use std::sync::Arc;
use std::time::Duration;

use govwatch_core::config::TelegramConfig;
use govwatch_core::notifier::MAX_MESSAGE_LEN;
use govwatch_core::{
    CycleOutcome, CycleReport, ErrorCategory, HttpProposalSource, MemoryStore, Notifier,
    Proposal, ProposalSource, ProposalStore, ReconcileEngine, TelegramNotifier,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123456:test-token";
const CHAT_ID: i64 = -100200300;
const EXPLORER: &str = "https://explorer.example.org/proposals";

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn telegram_config(server: &MockServer) -> TelegramConfig {
    TelegramConfig {
        bot_token: TOKEN.to_string(),
        chat_id: CHAT_ID,
        api_url: server.uri(),
    }
}

fn feed(items: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "proposals": items,
        "pagination": { "next_key": null, "total": "0" }
    }))
}

async fn mount_get_me(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "id": 42, "is_bot": true, "first_name": "gov", "username": "gov_bot" }
        })))
        .mount(server)
        .await;
}

fn sent_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": { "message_id": 1, "date": 0, "chat": { "id": CHAT_ID, "type": "channel" } }
    }))
}

#[tokio::test]
async fn fetch_decodes_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proposals"))
        .respond_with(feed(json!([
            { "proposal_id": "1", "content": { "title": "T1", "description": "D1", "extra": 1 } },
            { "proposal_id": "2", "status": "PASSED", "content": { "title": "T2" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpProposalSource::new(http_client(), format!("{}/proposals", server.uri()));
    let proposals = source.fetch().await.unwrap();

    assert_eq!(
        proposals,
        vec![Proposal::new("1", "T1", "D1"), Proposal::new("2", "T2", "")]
    );
}

#[tokio::test]
async fn fetch_non_success_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let source = HttpProposalSource::new(http_client(), server.uri());
    let err = source.fetch().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Fetch);
    assert!(err.to_string().contains("503"), "{err}");
}

#[tokio::test]
async fn fetch_garbage_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let source = HttpProposalSource::new(http_client(), server.uri());
    let err = source.fetch().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
}

#[tokio::test]
async fn fetch_unreachable_is_fetch_error() {
    // Nothing listens on port 1.
    let source = HttpProposalSource::new(http_client(), "http://127.0.0.1:1/proposals");
    let err = source.fetch().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Fetch);
}

#[tokio::test]
async fn telegram_connect_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "id": 42, "is_bot": true, "first_name": "gov" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::connect(http_client(), &telegram_config(&server))
        .await
        .unwrap();
    assert_eq!(notifier.chat_id(), CHAT_ID);
}

#[tokio::test]
async fn telegram_bad_token_fails_without_leaking_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let err = TelegramNotifier::connect(http_client(), &telegram_config(&server))
        .await
        .err()
        .expect("connect should fail");
    assert_eq!(err.category(), ErrorCategory::Notify);
    let text = err.to_string();
    assert!(text.contains("Unauthorized"), "{text}");
    assert!(!text.contains(TOKEN), "{text}");
}

#[tokio::test]
async fn telegram_sends_formatted_message() {
    let server = MockServer::start().await;
    mount_get_me(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_json(json!({
            "chat_id": CHAT_ID,
            "text": format!(
                "New Proposal:\nID: 5\nTitle: Upgrade\nDescription: v2 upgrade\nExplorer: {EXPLORER}/5"
            )
        })))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::connect(http_client(), &telegram_config(&server))
        .await
        .unwrap();
    notifier
        .notify(&Proposal::new("5", "Upgrade", "v2 upgrade"), EXPLORER)
        .await
        .unwrap();
}

#[tokio::test]
async fn telegram_long_description_keeps_explorer_line() {
    let server = MockServer::start().await;
    mount_get_me(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::connect(http_client(), &telegram_config(&server))
        .await
        .unwrap();
    notifier
        .notify(&Proposal::new("912", "Upgrade", "x".repeat(6000)), EXPLORER)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let sent = requests
        .iter()
        .find(|r| r.url.path().ends_with("/sendMessage"))
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
    let text = body["text"].as_str().unwrap();
    assert!(text.starts_with("New Proposal:\nID: 912\nTitle: Upgrade\nDescription: x"));
    assert!(text.ends_with(&format!("\nExplorer: {EXPLORER}/912")), "{text}");
    assert!(text.encode_utf16().count() <= MAX_MESSAGE_LEN);
}

#[tokio::test]
async fn telegram_rejection_is_notify_error() {
    let server = MockServer::start().await;
    mount_get_me(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::connect(http_client(), &telegram_config(&server))
        .await
        .unwrap();
    let err = notifier
        .notify(&Proposal::new("5", "t", "d"), EXPLORER)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Notify);
    assert!(err.to_string().contains("chat not found"), "{err}");
}

#[tokio::test]
async fn full_cycle_notifies_new_and_refreshes_known() {
    let feed_server = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_get_me(&telegram).await;

    Mock::given(method("GET"))
        .and(path("/proposals"))
        .respond_with(feed(json!([
            { "proposal_id": "1", "content": { "title": "T1", "description": "D1" } }
        ])))
        .up_to_n_times(1)
        .mount(&feed_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proposals"))
        .respond_with(feed(json!([
            { "proposal_id": "1", "content": { "title": "T1", "description": "D2" } }
        ])))
        .mount(&feed_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&telegram)
        .await;

    let client = http_client();
    let source = Arc::new(HttpProposalSource::new(
        client.clone(),
        format!("{}/proposals", feed_server.uri()),
    ));
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(
        TelegramNotifier::connect(client, &telegram_config(&telegram))
            .await
            .unwrap(),
    );
    let engine = ReconcileEngine::new(source, store.clone(), notifier, EXPLORER);

    let first = engine.run_cycle().await;
    assert_eq!(
        first.report(),
        Some(&CycleReport {
            fetched: 1,
            new: 1,
            ..CycleReport::default()
        })
    );

    let second = engine.run_cycle().await;
    assert_eq!(
        second.report(),
        Some(&CycleReport {
            fetched: 1,
            refreshed: 1,
            ..CycleReport::default()
        })
    );

    let stored = store.get("proposal:1").await.unwrap().unwrap();
    assert_eq!(stored, Proposal::new("1", "T1", "D2"));

    // Exactly one sendMessage: checked by `.expect(1)` when the server drops.
    let requests = telegram.received_requests().await.unwrap();
    let sends: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/sendMessage"))
        .collect();
    assert_eq!(sends.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&sends[0].body).unwrap();
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("ID: 1"));
    assert!(text.contains("Title: T1"));
    assert!(text.contains(&format!("Explorer: {EXPLORER}/1")));
}

#[tokio::test]
async fn full_cycle_aborts_on_feed_failure() {
    let feed_server = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_get_me(&telegram).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&feed_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(sent_ok())
        .expect(0)
        .mount(&telegram)
        .await;

    let client = http_client();
    let store = Arc::new(MemoryStore::new());
    let engine = ReconcileEngine::new(
        Arc::new(HttpProposalSource::new(client.clone(), feed_server.uri())),
        store.clone(),
        Arc::new(
            TelegramNotifier::connect(client, &telegram_config(&telegram))
                .await
                .unwrap(),
        ),
        EXPLORER,
    );

    match engine.run_cycle().await {
        CycleOutcome::Aborted(e) => assert_eq!(e.category(), ErrorCategory::Fetch),
        CycleOutcome::Completed(report) => panic!("expected abort, got {report:?}"),
    }
    assert!(store.is_empty().await);
}
