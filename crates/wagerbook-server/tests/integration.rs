#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Local, TimeZone};
use serde_json::{Value, json};
use tower::ServiceExt;

use wagerbook_core::FixedClock;
use wagerbook_ledger::auth::{CredentialError, CredentialVerifier, RosterWhitelist};
use wagerbook_ledger::storage::LedgerDatabase;
use wagerbook_ledger::{Ledger, LedgerSettings};
use wagerbook_server::routes::{AppState, build_router};

struct PlainCredentials;

impl CredentialVerifier for PlainCredentials {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, CredentialError> {
        Ok(stored.strip_prefix("plain:") == Some(password))
    }
}

async fn app() -> axum::Router {
    let db = LedgerDatabase::open_in_memory().await.unwrap();
    let clock = FixedClock::new(Local.with_ymd_and_hms(2026, 6, 20, 10, 0, 0).single().unwrap());
    let ledger = Ledger::new(
        db,
        LedgerSettings::default(),
        Arc::new(clock),
        Arc::new(RosterWhitelist::default()),
        Arc::new(PlainCredentials),
    );
    build_router(AppState { ledger })
}

/// Send a request and return (status, parsed JSON body).
async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn schedule() -> Value {
    json!({
        "home_team": "Brazil",
        "away_team": "Serbia",
        "home_win_odds": 2.0,
        "away_win_odds": 4.0,
        "draw_odds": 3.2,
        "scheduled_at": "2026-06-27 20:00:00",
        "group_label": "E",
        "stage": 0
    })
}

async fn setup_user_and_match(app: &axum::Router) -> (i64, i64) {
    let (status, body) = send(
        app,
        Method::POST,
        "/authorize",
        Some(json!({"chinese_name": "张三", "english_name": "zhangsan", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();

    let (status, body) = send(app, Method::PUT, "/new_schedule", Some(schedule())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let match_id = body["data"]["match"]["id"].as_i64().unwrap();

    (user_id, match_id)
}

#[tokio::test]
async fn authorize_registers_with_initial_balance() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/authorize",
        Some(json!({"chinese_name": "李四", "english_name": "lisi", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 0);
    assert_eq!(body["data"]["first_login"], true);
    assert_eq!(body["data"]["user"]["balance"], 5000.0);
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app().await;
    setup_user_and_match(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/authorize",
        Some(json!({"chinese_name": "张三", "english_name": "zhangsan", "password": "bad"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 8);
}

#[tokio::test]
async fn bet_then_settle_round_trip() {
    let app = app().await;
    let (user_id, match_id) = setup_user_and_match(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/bet",
        Some(json!({"user_id": user_id, "match_id": match_id, "stake": 1000, "predicted": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["odds"], 2.0);
    assert_eq!(body["data"]["status"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/bet",
        Some(json!({"user_id": user_id, "match_id": match_id, "stake": 5, "predicted": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 10);

    let (status, body) = send(
        &app,
        Method::POST,
        "/update_schedule",
        Some(json!({"match_id": match_id, "result": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["won"], 1);
    assert_eq!(body["data"]["paid_out"], 2000.0);

    let (status, body) = send(&app, Method::GET, &format!("/my?user_id={user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["balance"], 6000.0);
    assert_eq!(body["data"]["user"]["win_count"], 1);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/betting_history?user_id={user_id}"),
        None,
    )
    .await;
    assert_eq!(body["data"][0]["status"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/update_schedule",
        Some(json!({"match_id": match_id, "result": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 16);
}

#[tokio::test]
async fn bad_bets_are_classified() {
    let app = app().await;
    let (user_id, match_id) = setup_user_and_match(&app).await;

    let cases = [
        (json!({"user_id": user_id, "match_id": match_id, "stake": 0, "predicted": 1}), StatusCode::BAD_REQUEST, 1),
        (json!({"user_id": user_id, "match_id": match_id, "stake": 5, "predicted": 7}), StatusCode::BAD_REQUEST, 1),
        (json!({"user_id": user_id, "match_id": 999, "stake": 5, "predicted": 1}), StatusCode::NOT_FOUND, 2),
        (json!({"user_id": 999, "match_id": match_id, "stake": 5, "predicted": 1}), StatusCode::NOT_FOUND, 9),
        (json!({"user_id": user_id, "match_id": match_id, "stake": 9999, "predicted": 1}), StatusCode::BAD_REQUEST, 11),
        (json!({"user_id": user_id, "stake": 5}), StatusCode::BAD_REQUEST, 1),
    ];
    for (request, want_status, want_code) in cases {
        let (status, body) = send(&app, Method::POST, "/bet", Some(request.clone())).await;
        assert_eq!(status, want_status, "{request} -> {body}");
        assert_eq!(body["status"], want_code, "{request} -> {body}");
    }

    let (_, body) = send(
        &app,
        Method::POST,
        "/close_betting",
        Some(json!({"match_id": match_id})),
    )
    .await;
    assert_eq!(body["data"]["betting_disabled"], true);
    let (status, body) = send(
        &app,
        Method::POST,
        "/bet",
        Some(json!({"user_id": user_id, "match_id": match_id, "stake": 5, "predicted": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 13);
}

#[tokio::test]
async fn bet_lookup_finds_placed_bet_only() {
    let app = app().await;
    let (user_id, match_id) = setup_user_and_match(&app).await;
    let uri = format!("/bet?user_id={user_id}&match_id={match_id}");

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 15);

    send(
        &app,
        Method::POST,
        "/bet",
        Some(json!({"user_id": user_id, "match_id": match_id, "stake": 200, "predicted": 3})),
    )
    .await;
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["stake"], 200);
    assert_eq!(body["data"]["odds"], 3.2);

    let (status, body) = send(&app, Method::GET, "/bet?user_id=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 1);
}

#[tokio::test]
async fn daily_reward_occupied_by_signup() {
    let app = app().await;
    let (user_id, _) = setup_user_and_match(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/daily_reward",
        Some(json!({"user_id": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 14);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/reward_history?user_id={user_id}"),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["kind"], "signup");
}

#[tokio::test]
async fn schedules_filter_by_stage_and_create_is_idempotent() {
    let app = app().await;
    send(&app, Method::PUT, "/new_schedule", Some(schedule())).await;
    let (_, body) = send(&app, Method::PUT, "/new_schedule", Some(schedule())).await;
    assert_eq!(body["data"]["created"], false);

    let mut final_match = schedule();
    final_match["stage"] = json!(5);
    final_match["home_team"] = json!("France");
    send(&app, Method::PUT, "/new_schedule", Some(final_match)).await;

    let (_, body) = send(&app, Method::GET, "/schedules", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    let (_, body) = send(&app, Method::GET, "/schedules?type=5", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["home_team"], "France");

    let (status, body) = send(&app, Method::GET, "/schedules?type=9", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 1);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = app().await;
    setup_user_and_match(&app).await;
    let names = json!({"chinese_name": "张三", "english_name": "zhangsan", "password": "new"});

    let (status, body) = send(&app, Method::POST, "/reset_password", Some(names.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 12);

    let (status, _) = send(
        &app,
        Method::POST,
        "/grant_reset_password",
        Some(json!({"chinese_name": "张三", "english_name": "zhangsan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, "/reset_password", Some(names.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::POST, "/authorize", Some(names)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rank_and_reconcile() {
    let app = app().await;
    let (user_id, match_id) = setup_user_and_match(&app).await;
    send(
        &app,
        Method::POST,
        "/bet",
        Some(json!({"user_id": user_id, "match_id": match_id, "stake": 10, "predicted": 2})),
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/rank", None).await;
    assert_eq!(body["data"][0]["user_id"], user_id);
    assert_eq!(body["data"][0]["balance"], 4990.0);

    let (status, body) = send(&app, Method::POST, "/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checked"], 1);
    assert_eq!(body["data"]["repairs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn cors_headers_present() {
    let app = app().await;
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/rank")
                .header("origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}
