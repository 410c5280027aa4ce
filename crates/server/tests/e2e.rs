use std::net::SocketAddr;

use axum::Router;
use migration::MigratorTrait;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::identity::{sign_identity, ServerAuthConfig, ServerState};
use server::routes;
use service::identity::Identity;

const JWT_SECRET: &str = "test-secret";

struct TestApp {
    base_url: String,
    token: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token for a second, unrelated tenant.
    fn foreign_token(&self) -> String {
        let identity = Identity {
            id: "test-user-2".into(),
            tenant_id: format!("test-tenant_{}", Uuid::new_v4()),
            role: "admin".into(),
        };
        sign_identity(&identity, JWT_SECRET).expect("sign token")
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Ensure env-driven configuration; config files must not interfere
    std::env::set_var("CONFIG_PATH", "/nonexistent-config-for-tests.toml");

    // Use DATABASE_URL from environment; if not present, skip e2e tests
    if std::env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!("missing DATABASE_URL"));
    }

    let db = models::db::connect().await?;
    migration::Migrator::up(&db, None).await?;

    let state = ServerState::new(db, ServerAuthConfig { jwt_secret: JWT_SECRET.into() });

    let identity = Identity {
        id: "test-user-1".into(),
        tenant_id: format!("test-tenant_{}", Uuid::new_v4()),
        role: "admin".into(),
    };
    let token = sign_identity(&identity, JWT_SECRET)?;

    let app: Router = routes::build_router(CorsLayer::very_permissive(), state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, token })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn create_service(app: &TestApp, name: &str, description: Option<&str>) -> Value {
    let mut body = json!({ "name": name });
    if let Some(description) = description {
        body["description"] = json!(description);
    }
    let res = client()
        .post(app.url("/services"))
        .bearer_auth(&app.token)
        .json(&body)
        .send()
        .await
        .expect("create service");
    assert_eq!(res.status(), 201);
    res.json().await.expect("service body")
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let res = client().get(app.url("/health")).send().await?;
    assert_eq!(res.status(), 200);
    Ok(())
}

#[tokio::test]
async fn requests_without_identity_are_rejected() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let res = client().get(app.url("/services")).send().await?;
    assert_eq!(res.status(), 401);

    let res = client()
        .get(app.url("/services"))
        .bearer_auth("not-a-token")
        .send()
        .await?;
    assert_eq!(res.status(), 401);
    Ok(())
}

#[tokio::test]
async fn service_round_trip() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };

    let created = create_service(&app, "Service One", Some("First test service")).await;
    let id = created["id"].as_str().expect("id").to_string();

    let res = client()
        .get(app.url(&format!("/services/{id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["name"], "Service One");
    assert_eq!(body["description"], "First test service");
    assert_eq!(body["versionsCount"], 0);

    // unknown id is a plain 404
    let res = client()
        .get(app.url(&format!("/services/{}", Uuid::new_v4())))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}

#[tokio::test]
async fn invalid_service_payloads_fail() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };

    // missing name is rejected at the typed boundary
    let res = client()
        .post(app.url("/services"))
        .bearer_auth(&app.token)
        .json(&json!({}))
        .send()
        .await?;
    assert!(res.status().is_client_error());

    // blank name fails domain validation
    let res = client()
        .post(app.url("/services"))
        .bearer_auth(&app.token)
        .json(&json!({ "name": "  " }))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    Ok(())
}

#[tokio::test]
async fn replace_is_idempotent() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let id = Uuid::new_v4();
    let body = json!({ "name": "Stable", "description": "same every time" });

    let res = client()
        .put(app.url(&format!("/services/{id}")))
        .bearer_auth(&app.token)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let first: Value = res.json().await?;

    let res = client()
        .put(app.url(&format!("/services/{id}")))
        .bearer_auth(&app.token)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let second: Value = res.json().await?;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["name"], second["name"]);
    assert_eq!(first["createdAt"], second["createdAt"]);

    // a single row exists for it
    let res = client()
        .get(app.url("/services?search=Stable"))
        .bearer_auth(&app.token)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["meta"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn partial_update_and_not_found() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let created = create_service(&app, "Patchable", Some("before")).await;
    let id = created["id"].as_str().expect("id").to_string();

    let res = client()
        .patch(app.url(&format!("/services/{id}")))
        .bearer_auth(&app.token)
        .json(&json!({ "description": "after" }))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["name"], "Patchable");
    assert_eq!(body["description"], "after");

    let res = client()
        .patch(app.url(&format!("/services/{}", Uuid::new_v4())))
        .bearer_auth(&app.token)
        .json(&json!({ "name": "ghost" }))
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}

#[tokio::test]
async fn delete_succeeds_once_then_404s() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let created = create_service(&app, "Ephemeral", None).await;
    let id = created["id"].as_str().expect("id").to_string();

    let res = client()
        .delete(app.url(&format!("/services/{id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 204);

    let res = client()
        .delete(app.url(&format!("/services/{id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}

#[tokio::test]
async fn listing_pages_and_sorts() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    for i in 0..15 {
        create_service(&app, &format!("svc-{i:02}"), None).await;
    }

    // total ignores pagination
    let res = client()
        .get(app.url("/services?offset=10&limit=10"))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let page: Value = res.json().await?;
    assert_eq!(page["data"].as_array().expect("data").len(), 5);
    assert_eq!(page["meta"]["total"], 15);

    // multi-key sort, descending names first
    let res = client()
        .get(app.url("/services?sort=name%20desc&limit=15"))
        .bearer_auth(&app.token)
        .send()
        .await?;
    let page: Value = res.json().await?;
    let names: Vec<&str> = page["data"]
        .as_array()
        .expect("data")
        .iter()
        .map(|row| row["name"].as_str().expect("name"))
        .collect();
    let mut expected: Vec<String> = (0..15).map(|i| format!("svc-{i:02}")).collect();
    expected.reverse();
    assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());

    // unknown sort keys are rejected
    let res = client()
        .get(app.url("/services?sort=bogus%20desc"))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 400);

    // zero limit is rejected
    let res = client()
        .get(app.url("/services?limit=0"))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    Ok(())
}

#[tokio::test]
async fn tenants_cannot_see_each_other() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let created = create_service(&app, "Private", None).await;
    let id = created["id"].as_str().expect("id").to_string();
    let foreign = app.foreign_token();

    let res = client()
        .get(app.url(&format!("/services/{id}")))
        .bearer_auth(&foreign)
        .send()
        .await?;
    assert_eq!(res.status(), 404);

    let res = client()
        .get(app.url("/services"))
        .bearer_auth(&foreign)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["meta"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn version_lifecycle_under_a_service() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let created = create_service(&app, "Versioned", None).await;
    let service_id = created["id"].as_str().expect("id").to_string();

    // parent must exist
    let res = client()
        .post(app.url(&format!("/services/{}/versions", Uuid::new_v4())))
        .bearer_auth(&app.token)
        .json(&json!({ "name": "v1.0.0" }))
        .send()
        .await?;
    assert_eq!(res.status(), 404);

    let res = client()
        .post(app.url(&format!("/services/{service_id}/versions")))
        .bearer_auth(&app.token)
        .json(&json!({ "name": "v1.0.0", "description": "Initial release" }))
        .send()
        .await?;
    assert_eq!(res.status(), 201);
    let version: Value = res.json().await?;
    let version_id = version["id"].as_str().expect("id").to_string();

    // the parent's aggregate follows
    let res = client()
        .get(app.url(&format!("/services/{service_id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["versionsCount"], 1);

    let res = client()
        .get(app.url(&format!("/services/{service_id}/versions")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    let page: Value = res.json().await?;
    assert_eq!(page["meta"]["total"], 1);

    let res = client()
        .patch(app.url(&format!("/services/{service_id}/versions/{version_id}")))
        .bearer_auth(&app.token)
        .json(&json!({ "name": "v1.0.1" }))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["name"], "v1.0.1");
    assert_eq!(body["description"], "Initial release");

    let res = client()
        .delete(app.url(&format!("/services/{service_id}/versions/{version_id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 204);
    let res = client()
        .delete(app.url(&format!("/services/{service_id}/versions/{version_id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}

#[tokio::test]
async fn deleting_a_service_cascades_to_versions() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(app) => app,
        Err(_) => return Ok(()),
    };
    let created = create_service(&app, "Cascade", None).await;
    let service_id = created["id"].as_str().expect("id").to_string();

    let res = client()
        .post(app.url(&format!("/services/{service_id}/versions")))
        .bearer_auth(&app.token)
        .json(&json!({ "name": "v1.0.0" }))
        .send()
        .await?;
    assert_eq!(res.status(), 201);
    let version: Value = res.json().await?;
    let version_id = version["id"].as_str().expect("id").to_string();

    let res = client()
        .delete(app.url(&format!("/services/{service_id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 204);

    // the version went with its parent
    let res = client()
        .get(app.url(&format!("/services/{service_id}/versions/{version_id}")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}
