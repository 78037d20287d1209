//! End-to-end over TCP against Postgres. Skipped unless `DATABASE_URL` is set
//! and `SKIP_DB_TESTS` is not.

use std::net::SocketAddr;
use std::sync::Arc;

use configs::AuthConfig;
use jsonwebtoken::{encode, EncodingKey, Header};
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use service::policy::PolicyTable;
use tokio::net::TcpListener;
use uuid::Uuid;

use server::auth::{Gate, JwtAuthorizer};
use server::state::AppState;

const SECRET: &str = "e2e-secret";

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip e2e tests.");
        return Err(anyhow::anyhow!("missing DATABASE_URL"));
    }

    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }

    let auth = AuthConfig { jwt_secret: Some(SECRET.into()), ..Default::default() };
    let authorizer = Arc::new(JwtAuthorizer::from_config(&auth)?);
    let state = AppState::with_database(db, Gate::new(PolicyTable::defaults()), authorizer);
    let app = server::build_app(state);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

fn bearer(roles: &[&str]) -> String {
    let exp = chrono::Utc::now().timestamp() + 600;
    let claims = json!({"sub": "e2e", "exp": exp, "realm_access": {"roles": roles}});
    let t = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).expect("sign");
    format!("Bearer {t}")
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_catalog_cascade() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let client = reqwest::Client::new();
    let user = bearer(&["app-user"]);
    let admin = bearer(&["app-admin"]);
    let tag = Uuid::new_v4().simple().to_string();

    let res = client
        .post(format!("{}/categories", app.base_url))
        .header("Authorization", &user)
        .json(&json!({"name": format!("Electronics {tag}")}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let cat: Value = res.json().await?;
    let cat_id = cat["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .post(format!("{}/products", app.base_url))
        .header("Authorization", &user)
        .json(&json!({"name": format!("Phone {tag}"), "price": 299.99, "category_id": cat_id}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let phone: Value = res.json().await?;
    let phone_id = phone["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .get(format!("{}/products?page=1&limit=5&search={tag}", app.base_url))
        .header("Authorization", &user)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["meta"]["total_items"], 1);
    assert_eq!(page["items"][0]["category"]["id"], cat_id.as_str());

    let res = client
        .delete(format!("{}/categories/{cat_id}", app.base_url))
        .header("Authorization", &admin)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/products/{phone_id}", app.base_url))
        .header("Authorization", &user)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}
