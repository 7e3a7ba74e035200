use std::sync::Arc;

use http::StatusCode;
use serde_json::{json, Value};
use tokendsl::prelude::*;
use tokendsl_demo::{api, UserStore};
use tokendsl_test::TestClient;

fn client() -> TestClient {
    let store = Arc::new(UserStore::new());
    TestClient::new(Service::new(AppConfig::default()).app(api(&store)).unwrap())
}

async fn create_john(client: &TestClient) -> String {
    let response = client
        .post("/api/users")
        .json(&json!({"name": "John Doe", "email": "john@example.com", "age": 30}))
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json_value().unwrap()["id"]
        .as_str()
        .expect("created user has an id")
        .to_string()
}

#[tokio::test]
async fn list_starts_empty() {
    client()
        .get("/api/users")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json(&json!([]));
}

#[tokio::test]
async fn create_then_list_and_get() {
    let client = client();
    let id = create_john(&client).await;

    let users: Vec<Value> = client.get("/api/users").send().await.json().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "John Doe");
    assert_eq!(users[0]["age"], 30);

    client
        .get(format!("/api/users/{id}"))
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json(&json!({
            "id": id,
            "name": "John Doe",
            "email": "john@example.com",
            "age": 30
        }));
}

#[tokio::test]
async fn reads_are_idempotent() {
    let client = client();
    let id = create_john(&client).await;

    let first = client.get(format!("/api/users/{id}")).send().await;
    let second = client.get(format!("/api/users/{id}")).send().await;
    assert_eq!(first.json_value().unwrap(), second.json_value().unwrap());
}

#[tokio::test]
async fn unknown_user_is_404() {
    let client = client();
    for response in [
        client.get("/api/users/123").send().await,
        client.put("/api/users/123").json(&json!({"name": "X"})).send().await,
        client.delete("/api/users/123").send().await,
    ] {
        response
            .assert_status(StatusCode::NOT_FOUND)
            .assert_json(&json!({"error": "User not found"}));
    }
}

#[tokio::test]
async fn invalid_user_is_rejected() {
    let client = client();
    client
        .post("/api/users")
        .json(&json!({"name": "John Doe", "email": "invalid-email", "age": -1}))
        .send()
        .await
        .assert_validation_issue("email")
        .assert_validation_issue("age");

    client
        .get("/api/users")
        .send()
        .await
        .assert_json(&json!([]));
}

#[tokio::test]
async fn missing_required_fields() {
    client()
        .post("/api/users")
        .json(&json!({}))
        .send()
        .await
        .assert_validation_issue("name")
        .assert_validation_issue("email");
}

#[tokio::test]
async fn put_updates_only_given_fields() {
    let client = client();
    let id = create_john(&client).await;

    client
        .put(format!("/api/users/{id}"))
        .json(&json!({"name": "John Updated", "age": 31}))
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json(&json!({
            "id": id,
            "name": "John Updated",
            "email": "john@example.com",
            "age": 31
        }));
}

#[tokio::test]
async fn put_validates_present_fields() {
    let client = client();
    let id = create_john(&client).await;

    client
        .put(format!("/api/users/{id}"))
        .json(&json!({"email": "nope"}))
        .send()
        .await
        .assert_validation_issue("email");
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let client = client();
    let id = create_john(&client).await;

    client
        .delete(format!("/api/users/{id}"))
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json(&json!({"success": true}));

    client
        .get(format!("/api/users/{id}"))
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_json(&json!({"error": "User not found"}));
}

#[tokio::test]
async fn list_paging_from_query() {
    let client = client();
    for _ in 0..3 {
        create_john(&client).await;
    }

    let page: Vec<Value> = client
        .get("/api/users")
        .query(&[("offset", "1"), ("limit", "5")])
        .send()
        .await
        .json()
        .unwrap();
    assert_eq!(page.len(), 2);

    client
        .get("/api/users?limit=0")
        .send()
        .await
        .assert_validation_issue("limit");
}

#[test]
fn catalog_lists_documentation_in_order() {
    let store = Arc::new(UserStore::new());
    let registry = Service::new(AppConfig::default()).registry(api(&store)).unwrap();
    let catalog = serde_json::to_value(registry.catalog()).unwrap();

    let routes: Vec<&str> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["route"].as_str().unwrap())
        .collect();
    assert_eq!(
        routes,
        [
            "GET /api/users",
            "GET /api/users/:id",
            "POST /api/users",
            "PUT /api/users/:id",
            "DELETE /api/users/:id",
        ]
    );
    assert_eq!(catalog[2]["description"], "Create a user");
    assert_eq!(catalog[2]["tags"], json!(["users", "create"]));
    assert_eq!(catalog[2]["validated"], true);
    assert_eq!(catalog[1]["ui_schema"]["layout"], "card");
}
