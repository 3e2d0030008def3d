//! Wallet callback contract tests, driven through the full axum router.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use seamless_wallet::api::ApiServer;
use seamless_wallet::config::{ApiConfig, ProviderConfig, RoundConfig, SessionConfig};
use seamless_wallet::rounds::RoundService;
use seamless_wallet::sessions::SessionService;
use seamless_wallet::store::{
    BalanceStore, InMemoryBalanceStore, InMemoryRoundStore, InMemorySessionStore,
    InMemoryTransactionStore,
};
use seamless_wallet::wallet::TransactionHandler;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> (axum::Router, Arc<InMemoryBalanceStore>) {
    let provider = ProviderConfig {
        agent_id: "agent-1".to_string(),
        secret_key: "integration-secret".to_string(),
        currency: "USD".to_string(),
        launch_base_url: "https://games.example".to_string(),
    };
    let balances = Arc::new(InMemoryBalanceStore::new());
    let rounds = Arc::new(RoundService::new(
        Arc::new(InMemoryRoundStore::new()),
        &RoundConfig::default(),
    ));
    let sessions = Arc::new(SessionService::new(
        Arc::new(InMemorySessionStore::new()),
        balances.clone(),
        &SessionConfig::default(),
    ));
    let handler = Arc::new(TransactionHandler::new(
        &provider,
        balances.clone(),
        Arc::new(InMemoryTransactionStore::new()),
        rounds,
        sessions,
    ));
    let server = ApiServer::new(ApiConfig::default(), handler);
    (server.create_app(), balances)
}

async fn post_callback(app: &axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/wallet/callback")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_debit_callback_success() {
    let (app, balances) = test_app();
    balances.set_balance("p1", "USD", 100.0);

    let (status, body) = post_callback(
        &app,
        json!({
            "agentid": "agent-1",
            "playerid": "p1",
            "trxid": "tx-100",
            "type": "debit",
            "amount": 12.5,
            "roundid": "r-100"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errorcode"], "0");
    assert_eq!(body["balance"], 87.5);
}

#[tokio::test]
async fn test_retried_callback_returns_identical_response() {
    let (app, balances) = test_app();
    balances.set_balance("p1", "USD", 100.0);

    let payload = json!({
        "agentid": "agent-1",
        "playerid": "p1",
        "trxid": "tx-retry",
        "type": "debit",
        "amount": 5.0
    });

    let (_, first) = post_callback(&app, payload.clone()).await;
    let (_, second) = post_callback(&app, payload).await;

    assert_eq!(first, second);
    assert_eq!(first["balance"], 95.0);
    assert_eq!(balances.get_balance("p1", "USD").await.unwrap(), 95.0);
}

#[tokio::test]
async fn test_malformed_body_yields_invalid_request_code() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/wallet/callback")
                .header("content-type", "application/json")
                .body(Body::from("not json at all"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Protocol errors stay HTTP 200 with an errorcode.
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errorcode"], "2");
    assert_eq!(body["balance"], 0.0);
}

#[tokio::test]
async fn test_agent_mismatch_rejected() {
    let (app, balances) = test_app();
    balances.set_balance("p1", "USD", 100.0);

    let (_, body) = post_callback(
        &app,
        json!({
            "agentid": "intruder",
            "playerid": "p1",
            "trxid": "tx-bad-agent",
            "type": "debit",
            "amount": 5.0
        }),
    )
    .await;

    assert_eq!(body["errorcode"], "2");
    assert_eq!(balances.get_balance("p1", "USD").await.unwrap(), 100.0);
}

#[tokio::test]
async fn test_insufficient_funds_code() {
    let (app, balances) = test_app();
    balances.set_balance("p1", "USD", 2.0);

    let (_, body) = post_callback(
        &app,
        json!({
            "agentid": "agent-1",
            "playerid": "p1",
            "trxid": "tx-broke",
            "type": "debit",
            "amount": 10.0
        }),
    )
    .await;

    assert_eq!(body["errorcode"], "3");
    assert_eq!(body["balance"], 2.0);
}

#[tokio::test]
async fn test_bet_then_win_flow() {
    let (app, balances) = test_app();
    balances.set_balance("p1", "USD", 50.0);

    let (_, bet) = post_callback(
        &app,
        json!({
            "agentid": "agent-1",
            "playerid": "p1",
            "trxid": "tx-bet",
            "type": "debit",
            "amount": 10.0,
            "gamecode": "vs20doghouse",
            "roundid": "r-flow"
        }),
    )
    .await;
    assert_eq!(bet["errorcode"], "0");
    assert_eq!(bet["balance"], 40.0);

    let (_, win) = post_callback(
        &app,
        json!({
            "agentid": "agent-1",
            "playerid": "p1",
            "trxid": "tx-win",
            "type": "credit",
            "amount": 25.0,
            "gamecode": "vs20doghouse",
            "roundid": "r-flow"
        }),
    )
    .await;
    assert_eq!(win["errorcode"], "0");
    assert_eq!(win["balance"], 65.0);
}
