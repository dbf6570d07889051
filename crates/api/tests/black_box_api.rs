use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use topup_core::ChannelId;
use topup_infra::{MemoryStore, TracingNotifier};

const ADMIN_CHANNEL: i64 = -100_777;
const ALICE: i64 = 900_100;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the app (same router as prod) against the in-memory store,
        // but bind to an ephemeral port.
        let app = topup_api::app::build_app_with(
            Arc::new(MemoryStore::new()),
            Arc::new(TracingNotifier),
            ChannelId::new(ADMIN_CHANNEL),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn user_actor(external_id: i64) -> Value {
    json!({
        "external_id": external_id,
        "username": "alice",
        "display_name": "Alice",
        "channel": external_id,
    })
}

fn admin_actor() -> Value {
    json!({
        "external_id": 4242,
        "username": "auditor",
        "channel": ADMIN_CHANNEL,
    })
}

async fn post_event(client: &reqwest::Client, base_url: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/events", base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn balance_minor(client: &reqwest::Client, base_url: &str, external_id: i64) -> i64 {
    let res = client
        .get(format!("{}/accounts/{}/balance", base_url, external_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json::<Value>().await.unwrap()["balance_minor"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn topup_happy_path_credits_the_declared_amount() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "create-ticket",
            "actor": user_actor(ALICE),
            "declared_amount": "100.00",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let ticket: Value = res.json().await.unwrap();
    let ticket_id = ticket["id"].as_i64().unwrap();
    assert_eq!(ticket["status"], "PENDING");
    assert_eq!(ticket["declared_amount"], "100.00");

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "attach-proof",
            "actor": user_actor(ALICE),
            "proof_ref": "file-abc123",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let ticket: Value = res.json().await.unwrap();
    assert_eq!(ticket["proof_ref"], "file-abc123");

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "decide",
            "actor": admin_actor(),
            "ticket_id": ticket_id,
            "decision": "approve",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let ticket: Value = res.json().await.unwrap();
    assert_eq!(ticket["status"], "APPROVED");
    assert_eq!(ticket["audited_amount"], "100.00");

    assert_eq!(balance_minor(&client, &srv.base_url, ALICE).await, 10_000);

    // The second decision attempt reports the conflict instead of
    // double-crediting.
    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "decide",
            "actor": admin_actor(),
            "ticket_id": ticket_id,
            "decision": "approve",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_decided");
    assert_eq!(balance_minor(&client, &srv.base_url, ALICE).await, 10_000);
}

#[tokio::test]
async fn proof_lands_on_the_later_of_two_pending_tickets() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for declared in ["50.00", "70.00"] {
        let res = post_event(
            &client,
            &srv.base_url,
            json!({
                "intent": "create-ticket",
                "actor": user_actor(ALICE),
                "declared_amount": declared,
            }),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        ids.push(res.json::<Value>().await.unwrap()["id"].as_i64().unwrap());
    }
    let (t1, t2) = (ids[0], ids[1]);

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "attach-proof",
            "actor": user_actor(ALICE),
            "proof_ref": "file-later",
        }),
    )
    .await;
    let with_proof: Value = res.json().await.unwrap();
    assert_eq!(with_proof["id"].as_i64().unwrap(), t2);

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "decide",
            "actor": admin_actor(),
            "ticket_id": t2,
            "decision": "approve",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/tickets/{}", srv.base_url, t1))
        .send()
        .await
        .unwrap();
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["status"], "PENDING");
    assert_eq!(first["proof_ref"], Value::Null);

    assert_eq!(balance_minor(&client, &srv.base_url, ALICE).await, 7_000);
}

#[tokio::test]
async fn decisions_from_outside_the_admin_channel_are_refused() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "create-ticket",
            "actor": user_actor(ALICE),
            "declared_amount": "100.00",
        }),
    )
    .await;
    let ticket_id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // The requester tries to approve their own ticket from their own chat.
    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "decide",
            "actor": user_actor(ALICE),
            "ticket_id": ticket_id,
            "decision": "approve",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = client
        .get(format!("{}/tickets/{}", srv.base_url, ticket_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["status"], "PENDING");
    assert_eq!(balance_minor(&client, &srv.base_url, ALICE).await, 0);
}

#[tokio::test]
async fn approval_with_override_credits_the_audited_amount() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "create-ticket",
            "actor": user_actor(ALICE),
            "declared_amount": "100.00",
        }),
    )
    .await;
    let ticket_id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "decide",
            "actor": admin_actor(),
            "ticket_id": ticket_id,
            "decision": "approve",
            "audited_amount": "80.00",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let ticket: Value = res.json().await.unwrap();
    assert_eq!(ticket["audited_amount"], "80.00");
    assert_eq!(ticket["declared_amount"], "100.00");

    assert_eq!(balance_minor(&client, &srv.base_url, ALICE).await, 8_000);

    let res = client
        .get(format!("{}/accounts/{}/overview", srv.base_url, ALICE))
        .send()
        .await
        .unwrap();
    let overview: Value = res.json().await.unwrap();
    assert_eq!(overview["balance"], "80.00");
    assert_eq!(overview["recent"][0]["ref_type"], "TICKET");
    assert_eq!(overview["recent"][0]["ref_id"].as_i64().unwrap(), ticket_id);
}

#[tokio::test]
async fn malformed_amounts_never_reach_the_workflow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for bad in ["0", "-5", "abc", "1.234"] {
        let res = post_event(
            &client,
            &srv.base_url,
            json!({
                "intent": "create-ticket",
                "actor": user_actor(ALICE),
                "declared_amount": bad,
            }),
        )
        .await;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "amount {bad:?} should be rejected"
        );
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_amount");
    }

    assert_eq!(balance_minor(&client, &srv.base_url, ALICE).await, 0);
}

#[tokio::test]
async fn proof_without_a_ticket_reports_no_active_ticket() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_event(
        &client,
        &srv.base_url,
        json!({
            "intent": "attach-proof",
            "actor": user_actor(ALICE),
            "proof_ref": "file-orphan",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_active_ticket");
}
