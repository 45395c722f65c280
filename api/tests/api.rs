//! End-to-end tests over the HTTP surface

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use formdesk_api::{build_router, AppState};
use formdesk_core::{Formdesk, MemoryRepository};
use serde_json::{json, Value};
use std::sync::Arc;

const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "rootpass123";

async fn server() -> TestServer {
    let formdesk = Formdesk::new(Arc::new(MemoryRepository::new()), "test-secret", 1);
    formdesk.auth.bootstrap_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    TestServer::new(build_router(AppState::new(formdesk))).unwrap()
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

async fn register(server: &TestServer, email: &str) -> (String, String) {
    let response = server
        .post("/auth/register")
        .json(&json!({ "email": email, "password": "password123", "name": "Client" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn admin_token(server: &TestServer) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()["data"]["token"].as_str().unwrap().to_string()
}

/// Creates a published contact form and returns its id
async fn contact_form(server: &TestServer, token: &str) -> String {
    let (name, value) = bearer(token);
    let response = server
        .post("/forms")
        .add_header(name, value)
        .json(&json!({
            "title": "Contact Us",
            "published": true,
            "fields": [
                { "label": "Name", "type": "TEXT", "required": true },
                { "label": "Topic", "type": "DROPDOWN", "options": ["Sales", "Support"] },
                { "label": "Channels", "type": "CHECKBOX", "options": ["Email", "Phone"] }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_str().unwrap().to_string()
}

async fn submit(server: &TestServer, form_id: &str, data: Value) -> axum_test::TestResponse {
    server.post("/submissions").json(&json!({ "formId": form_id, "data": data })).await
}

#[tokio::test]
async fn test_health_and_openapi() {
    let server = server().await;
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let health: Value = response.json();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["storage"], "memory");
    assert!(health["checkedAt"].is_string());

    let doc: Value = server.get("/api-docs/openapi.json").await.json();
    assert!(doc["paths"]["/forms/{id}/fields/order"].is_object());
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let server = server().await;
    let response = server.get("/forms").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (name, value) = bearer("garbage");
    let response = server.get("/auth/profile").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let server = server().await;
    register(&server, "ada@example.com").await;

    let response = server
        .post("/auth/register")
        .json(&json!({ "email": "ADA@example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_profile() {
    let server = server().await;
    let (token, id) = register(&server, "ada@example.com").await;
    let (name, value) = bearer(&token);

    let body: Value = server.get("/auth/profile").add_header(name, value).await.json();
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["role"], "CLIENT");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_form_fields_in_order() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;

    let (name, value) = bearer(&token);
    let response = server
        .post(&format!("/forms/{}/fields", form_id))
        .add_header(name, value)
        .json(&json!({ "label": "Intro", "order": 0 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let (name, value) = bearer(&token);
    let body: Value = server.get(&format!("/forms/{}", form_id)).add_header(name, value).await.json();
    let orders: Vec<i64> = body["data"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["order"].as_i64().unwrap())
        .collect();
    assert!(orders.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(body["data"]["slug"], "contact-us");
}

#[tokio::test]
async fn test_reorder_fields() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;

    let (name, value) = bearer(&token);
    let form: Value = server.get(&format!("/forms/{}", form_id)).add_header(name, value).await.json();
    let mut ids: Vec<Value> = form["data"]["fields"].as_array().unwrap().iter().map(|f| f["id"].clone()).collect();
    ids.reverse();

    let (name, value) = bearer(&token);
    let response = server
        .put(&format!("/forms/{}/fields/order", form_id))
        .add_header(name, value)
        .json(&json!({ "fieldIds": ids }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let fields: Value = response.json();
    assert_eq!(fields["data"][0]["label"], "Channels");
    assert_eq!(fields["data"][2]["label"], "Name");
}

#[tokio::test]
async fn test_unpublished_form_rejects_submissions() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;

    let (name, value) = bearer(&token);
    let response = server
        .put(&format!("/forms/{}", form_id))
        .add_header(name, value)
        .json(&json!({ "published": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = submit(&server, &form_id, json!({ "Name": "Ada" })).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_submission_validation() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;

    let response = submit(&server, &form_id, json!({ "Topic": "Sales" })).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_FAILED");

    let response = submit(&server, &form_id, json!({ "Name": "Ada", "Topic": "Gold" })).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = submit(&server, &form_id, json!({ "Name": "Ada", "Topic": "Sales" })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_tenant_isolation() {
    let server = server().await;
    let (alice, _) = register(&server, "alice@example.com").await;
    let (bob, _) = register(&server, "bob@example.com").await;
    let admin = admin_token(&server).await;
    let form_id = contact_form(&server, &alice).await;
    submit(&server, &form_id, json!({ "Name": "Ada" })).await;

    for path in [format!("/forms/{}", form_id), format!("/submissions/form/{}", form_id)] {
        let (name, value) = bearer(&bob);
        assert_eq!(server.get(&path).add_header(name, value).await.status_code(), StatusCode::FORBIDDEN);

        let (name, value) = bearer(&admin);
        assert_eq!(server.get(&path).add_header(name, value).await.status_code(), StatusCode::OK);
    }

    let (name, value) = bearer(&bob);
    let body: Value = server.get("/submissions").add_header(name, value).await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (name, value) = bearer(&bob);
    assert_eq!(
        server.get("/users").add_header(name, value).await.status_code(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_form_delete_leaves_nothing_behind() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;
    let submission: Value = submit(&server, &form_id, json!({ "Name": "Ada" })).await.json();
    let submission_id = submission["data"]["id"].as_str().unwrap().to_string();

    let (name, value) = bearer(&token);
    let response = server.delete(&format!("/forms/{}", form_id)).add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    for path in [
        format!("/forms/{}", form_id),
        format!("/submissions/{}", submission_id),
        format!("/submissions/form/{}", form_id),
    ] {
        let (name, value) = bearer(&token);
        assert_eq!(server.get(&path).add_header(name, value).await.status_code(), StatusCode::NOT_FOUND);
    }

    let (name, value) = bearer(&token);
    let body: Value = server.get("/submissions").add_header(name, value).await.json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_public_form() {
    let server = server().await;
    let (token, client_id) = register(&server, "ada@example.com").await;
    contact_form(&server, &token).await;

    let response = server.get(&format!("/forms/public/{}/contact-us", client_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["fields"].as_array().unwrap().len(), 3);

    let response = server.get(&format!("/forms/public/{}/nope", client_id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_csv_export() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;
    submit(&server, &form_id, json!({ "Name": "First" })).await;
    submit(&server, &form_id, json!({ "Name": "Second", "Channels": ["Email", "Phone"] })).await;

    let (name, value) = bearer(&token);
    let response = server
        .get(&format!("/analytics/forms/{}/export", form_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(response
        .header("content-disposition")
        .to_str()
        .unwrap()
        .starts_with("attachment"));

    let csv = response.text();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "submission_id,submitted_at,Name,Topic,Channels");
    assert!(lines[1].contains(",First,"));
    assert!(lines[2].ends_with(",Second,,Email; Phone"));
}

#[tokio::test]
async fn test_timeline_zero_filled() {
    let server = server().await;
    let (token, _) = register(&server, "ada@example.com").await;
    let form_id = contact_form(&server, &token).await;
    submit(&server, &form_id, json!({ "Name": "Ada" })).await;

    let (name, value) = bearer(&token);
    let response = server
        .get("/analytics/timeline")
        .add_query_param("days", 5)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let points = body["data"]["points"].as_array().unwrap();
    assert_eq!(points.len(), 5);
    assert_eq!(points[4]["count"], 1);
    assert!(points[..4].iter().all(|p| p["count"] == 0));

    let (name, value) = bearer(&token);
    let response = server
        .get("/analytics/timeline")
        .add_query_param("days", 0)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_admin_analytics_and_user_management() {
    let server = server().await;
    let (alice, alice_id) = register(&server, "alice@example.com").await;
    let admin = admin_token(&server).await;
    let form_id = contact_form(&server, &alice).await;
    submit(&server, &form_id, json!({ "Name": "Ada" })).await;

    let (name, value) = bearer(&admin);
    let overview: Value = server.get("/analytics/overview").add_header(name, value).await.json();
    assert_eq!(overview["data"]["totalClients"], 1);
    assert_eq!(overview["data"]["totalSubmissions"], 1);

    let (name, value) = bearer(&alice);
    assert_eq!(
        server.get("/analytics/overview").add_header(name, value).await.status_code(),
        StatusCode::FORBIDDEN
    );

    let (name, value) = bearer(&admin);
    let response = server
        .put(&format!("/users/{}", alice_id))
        .add_header(name, value)
        .json(&json!({ "status": "SUSPENDED" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = bearer(&alice);
    assert_eq!(
        server.get("/forms").add_header(name, value).await.status_code(),
        StatusCode::UNAUTHORIZED
    );
}
