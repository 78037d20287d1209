//! Drives the full router in-process against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use configs::AuthConfig;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use service::mock::MemoryStore;
use service::policy::PolicyTable;
use tower::ServiceExt;

use server::auth::{Gate, JwtAuthorizer};
use server::state::AppState;

const SECRET: &str = "api-flow-secret";

fn app() -> Router {
    let auth = AuthConfig { jwt_secret: Some(SECRET.into()), ..Default::default() };
    let authorizer = Arc::new(JwtAuthorizer::from_config(&auth).expect("authorizer"));
    let state = AppState::in_memory(Arc::new(MemoryStore::new()), Gate::new(PolicyTable::defaults()), authorizer);
    server::build_app(state)
}

fn token(roles: &[&str]) -> String {
    let exp = chrono::Utc::now().timestamp() + 600;
    let claims = json!({"sub": "tester", "exp": exp, "realm_access": {"roles": roles}});
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).expect("sign")
}

fn admin() -> Option<String> { Some(token(&["app-admin"])) }
fn user() -> Option<String> { Some(token(&["app-user"])) }

async fn send(app: &Router, method: Method, uri: &str, bearer: Option<String>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/products/{id}"].is_object());
}

#[tokio::test]
async fn catalog_walkthrough_with_cascade() {
    let app = app();
    let (status, cat) = send(&app, Method::POST, "/categories", user(), Some(json!({"name": "Electronics"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(cat["description"].is_null());
    assert_eq!(cat["created_at"], cat["updated_at"]);
    let cat_id = cat["id"].as_str().unwrap().to_string();

    let (status, phone) = send(
        &app,
        Method::POST,
        "/products",
        user(),
        Some(json!({"name": "Phone", "price": 299.99, "category_id": cat_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let phone_id = phone["id"].as_str().unwrap().to_string();

    let (status, got) = send(&app, Method::GET, &format!("/products/{phone_id}"), user(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got["category"]["name"], "Electronics");

    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{cat_id}"), admin(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, err) = send(&app, Method::GET, &format!("/products/{phone_id}"), user(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "Not Found");
    assert_eq!(err["message"], format!("Product with ID {phone_id} not found"));

    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{cat_id}"), admin(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_envelope_and_pagination() {
    let app = app();
    for name in ["A", "B", "C"] {
        let (status, _) = send(&app, Method::POST, "/categories", user(), Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, page) = send(&app, Method::GET, "/categories?page=2&limit=1", user(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["name"], "B");
    assert_eq!(
        page["meta"],
        json!({"total_items": 3, "item_count": 1, "items_per_page": 1, "total_pages": 3, "current_page": 2})
    );

    let (_, all) = send(&app, Method::GET, "/categories", user(), None).await;
    assert_eq!(all["meta"]["items_per_page"], 3);
    assert_eq!(all["meta"]["total_pages"], 1);
    assert_eq!(all["items"][0]["name"], "C");

    let (_, found) = send(&app, Method::GET, "/categories?search=b", user(), None).await;
    assert_eq!(found["meta"]["total_items"], 1);

    let (status, err) = send(&app, Method::GET, "/categories?page=0&limit=10", user(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Validation Error");
    let (status, _) = send(&app, Method::GET, "/categories?page=1&limit=101", user(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, err) = send(&app, Method::GET, "/categories?page=18446744073709551615&limit=100", user(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "page is out of range");
    let (status, _) = send(&app, Method::GET, "/categories?page=abc", user(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn policy_table_is_enforced() {
    let app = app();
    // catalog needs a signed-in user
    let (status, body) = send(&app, Method::GET, "/categories", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    let (status, _) = send(&app, Method::GET, "/categories", Some("garbage".into()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, cat) = send(&app, Method::POST, "/categories", user(), Some(json!({"name": "Books"}))).await;
    let id = cat["id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, Method::PUT, &format!("/categories/{id}"), user(), Some(json!({"name": "X"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{id}"), user(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // audience list is public, even with a bad token
    let (status, _) = send(&app, Method::GET, "/subscribers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/subscriptions", Some("garbage".into()), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        Method::POST,
        "/subscribers",
        user(),
        Some(json!({"email": "ada@example.com", "name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::GET, "/subscribers/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_is_checked_before_input() {
    let app = app();
    let (status, _) = send(&app, Method::POST, "/subscribers", None, Some(json!({"nope": true}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/products/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_input_is_a_validation_error() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/products", user(), Some(json!({"name": "Phone"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");

    let (status, body) = send(
        &app,
        Method::POST,
        "/categories",
        user(),
        Some(json!({"name": "Art", "image": "not a url"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("image"));

    let (status, _) = send(&app, Method::GET, "/products/not-a-uuid", user(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::GET, "/subscribers/abc", user(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_with_unknown_category_is_404() {
    let app = app();
    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        Method::POST,
        "/products",
        user(),
        Some(json!({"name": "Ghost", "price": 1, "category_id": missing})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Category with ID {missing} not found"));
}

#[tokio::test]
async fn audience_partial_update_and_conflict() {
    let app = app();
    let (status, ada) = send(
        &app,
        Method::POST,
        "/subscribers",
        admin(),
        Some(json!({"email": "ada@example.com", "name": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ada_id = ada["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/subscribers",
        admin(),
        Some(json!({"email": "ada@example.com", "name": "Imposter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, sub) = send(
        &app,
        Method::POST,
        "/subscriptions",
        admin(),
        Some(json!({
            "subscriber_id": ada_id,
            "service": "mail",
            "topic": "weekly",
            "payload": {"lang": "en"},
            "expired_at": "2030-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sub["subscriber"]["email"], "ada@example.com");
    let sub_id = sub["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/subscriptions/{sub_id}"),
        admin(),
        Some(json!({"expired_at": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["expired_at"].is_null());
    assert_eq!(updated["payload"], json!({"lang": "en"}));
    assert_eq!(updated["topic"], "weekly");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/subscriptions/{sub_id}"),
        admin(),
        Some(json!({"subscriber_id": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, with_children) = send(&app, Method::GET, &format!("/subscribers/{ada_id}"), user(), None).await;
    assert_eq!(with_children["subscriptions"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/subscribers/{ada_id}"), admin(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, page) = send(&app, Method::GET, "/subscriptions", None, None).await;
    assert_eq!(page["meta"]["total_items"], 0);
}

#[tokio::test]
async fn unknown_id_on_update_and_delete_is_404() {
    let app = app();
    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, Method::PUT, &format!("/categories/{missing}"), admin(), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &format!("/products/{missing}"), admin(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
