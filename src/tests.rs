//! Integration tests for the tool finder backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::persistence::{MemoryLocalStore, UserDataService};
use crate::{create_router, AppState};

const PSK: &str = "test-api-key";
const USER: &str = "user-1";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::build(Some(PSK.to_string()), true).await
    }

    async fn unprovisioned() -> Self {
        Self::build(Some(PSK.to_string()), false).await
    }

    async fn build(psk: Option<String>, provision_tables: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let local_store_path = temp_dir.path().join("local");

        // Initialize remote store and local mirror
        let pool = init_database(&db_path, provision_tables)
            .await
            .expect("Failed to init DB");
        let remote = Arc::new(Repository::new(pool));
        let local = Arc::new(MemoryLocalStore::new());
        let user_data = Arc::new(UserDataService::new(remote, local));

        let catalog = Arc::new(Catalog::bundled().expect("Failed to load catalog"));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            local_store_path,
            catalog_path: None,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            provision_tables,
            typing_delay: false,
        };

        let state = AppState {
            catalog,
            user_data,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str, user: Option<&str>) -> (u16, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.header("x-user-id", user);
        }
        let resp = request.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/api/tools"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/tools"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = Client::new()
        .get(fixture.url("/api/tools"))
        .header("authorization", format!("Bearer {}", PSK))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_search_exact_name() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/search?q=chatgpt", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results[0]["name"], "ChatGPT");
    assert_eq!(results[0]["matchScore"], 100);
    assert_eq!(results[0]["matchReason"], "Exact name match");
    assert_eq!(results[0]["categoryName"], "Chatbots");
    assert_eq!(body["data"]["total"], results.len());
    assert!(body["data"]["answer"].as_str().unwrap().contains("ChatGPT"));
}

#[tokio::test]
async fn test_search_empty_query() {
    let fixture = TestFixture::new().await;

    for path in ["/api/search", "/api/search?q=", "/api/search?q=%20%20"] {
        let (status, body) = fixture.get_json(path, None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["total"], 0);
        assert!(body["data"]["results"].as_array().unwrap().is_empty());
        assert!(body["data"].get("answer").is_none());
    }
}

#[tokio::test]
async fn test_search_no_matches() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/search?q=zzzzqqq", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["query"], "zzzzqqq");
    assert_eq!(body["data"]["total"], 0);
    assert!(body["data"].get("answer").is_none());
}

#[tokio::test]
async fn test_search_filter_and_sort() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/search?q=a&category=chatbots&sort=rating", None)
        .await;
    assert_eq!(status, 200);

    let results = body["data"]["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["category"] == "chatbots"));

    let ratings: Vec<f64> = results.iter().map(|r| r["rating"].as_f64().unwrap()).collect();
    assert!(ratings.windows(2).all(|w| w[0] >= w[1]));

    let resp = fixture
        .client
        .get(fixture.url("/api/search?q=a&sort=random"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/tools", None).await;
    assert_eq!(status, 200);
    assert!(!body["data"].as_array().unwrap().is_empty());

    let (_, body) = fixture.get_json("/api/tools/trending", None).await;
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["trending"] == true));

    let (status, body) = fixture.get_json("/api/tools/midjourney", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Midjourney");
    assert_eq!(body["data"]["pricing"]["type"], "paid");

    let (status, body) = fixture.get_json("/api/tools/unknown-tool", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = fixture.get_json("/api/categories", None).await;
    assert_eq!(status, 200);
    assert!(body["data"][0]["subcategories"].is_array());
}

#[tokio::test]
async fn test_bundle_crud() {
    let fixture = TestFixture::new().await;

    // Save bundle
    let create_resp = fixture
        .client
        .post(fixture.url("/api/bundles"))
        .header("x-user-id", USER)
        .json(&json!({
            "name": "Content Starter",
            "description": "Write and illustrate blog posts",
            "cost": "$30/month",
            "tools": [{ "id": "jasper" }, { "id": "midjourney" }],
            "metadata": { "source": "finder" }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let bundle_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["name"], "Content Starter");
    assert!(create_body["data"]["savedAt"].is_string());

    // List bundles
    let (status, body) = fixture.get_json("/api/bundles", Some(USER)).await;
    assert_eq!(status, 200);
    let bundles = body["data"].as_array().unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0]["id"], bundle_id.as_str());
    assert_eq!(bundles[0]["tools"][1]["id"], "midjourney");

    // Other users see nothing
    let (_, body) = fixture.get_json("/api/bundles", Some("user-2")).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // Delete bundle
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/bundles/{}", bundle_id)))
        .header("x-user-id", USER)
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let (_, body) = fixture.get_json("/api/bundles", Some(USER)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_items_require_user_for_writes() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/workflows", None).await;
    assert_eq!(status, 200);
    assert!(body["data"].as_array().unwrap().is_empty());

    let resp = fixture
        .client
        .post(fixture.url("/api/workflows"))
        .json(&json!({ "name": "Anonymous" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let resp = fixture
        .client
        .delete(fixture.url("/api/workflows/w1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_save_validation() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/workflows"))
        .header("x-user-id", USER)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let fixture = TestFixture::new().await;

    // Identity is checked before the body
    let resp = fixture
        .client
        .post(fixture.url("/api/workflows"))
        .json(&json!({ "description": "no name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let resp = fixture
        .client
        .post(fixture.url("/api/bundles"))
        .header("x-user-id", USER)
        .json(&json!({ "description": "no name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .put(fixture.url("/api/draft"))
        .header("x-user-id", USER)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_remove_unknown_item_succeeds() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .delete(fixture.url("/api/workflows/does-not-exist"))
        .header("x-user-id", USER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/api/workflows", Some(USER)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unprovisioned_database_falls_back_to_local_mirror() {
    let fixture = TestFixture::unprovisioned().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/workflows"))
        .header("x-user-id", USER)
        .json(&json!({ "id": "w1", "name": "Research pipeline", "tools": ["claude"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = fixture.get_json("/api/workflows", Some(USER)).await;
    assert_eq!(status, 200);
    let workflows = body["data"].as_array().unwrap();
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0]["id"], "w1");

    let resp = fixture
        .client
        .put(fixture.url("/api/draft"))
        .header("x-user-id", USER)
        .json(&json!({ "name": "Offline draft", "workflow": { "steps": [] } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/api/draft", Some(USER)).await;
    assert_eq!(body["data"]["name"], "Offline draft");
}

#[tokio::test]
async fn test_draft_lifecycle() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/draft", Some(USER)).await;
    assert_eq!(status, 200);
    assert!(body["data"].is_null());

    // Autosave twice; the second replaces the first
    for name in ["First pass", "Second pass"] {
        let resp = fixture
            .client
            .put(fixture.url("/api/draft"))
            .header("x-user-id", USER)
            .json(&json!({
                "name": name,
                "workflow": { "steps": ["research", "write"] },
                "autoSaved": true
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["id"], format!("draft-{}", USER));
    }

    let (_, body) = fixture.get_json("/api/draft", Some(USER)).await;
    assert_eq!(body["data"]["name"], "Second pass");
    assert_eq!(body["data"]["autoSaved"], true);

    // Anonymous users have no draft
    let (_, body) = fixture.get_json("/api/draft", None).await;
    assert!(body["data"].is_null());

    let resp = fixture
        .client
        .delete(fixture.url("/api/draft"))
        .header("x-user-id", USER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/api/draft", Some(USER)).await;
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_publishing_workflow_clears_draft() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .put(fixture.url("/api/draft"))
        .header("x-user-id", USER)
        .json(&json!({ "name": "WIP", "workflow": { "steps": ["draft"] } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/api/workflows"))
        .header("x-user-id", USER)
        .json(&json!({ "name": "WIP", "tools": ["chatgpt"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/api/draft", Some(USER)).await;
    assert!(body["data"].is_null());

    let (_, body) = fixture.get_json("/api/workflows", Some(USER)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "WIP");
}

#[tokio::test]
async fn test_local_mirror_is_private_to_each_user() {
    let fixture = TestFixture::unprovisioned().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/bundles"))
        .header("x-user-id", "alice")
        .json(&json!({ "id": "secret", "name": "Alice private" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/api/bundles", Some("mallory")).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let resp = fixture
        .client
        .delete(fixture.url("/api/bundles/secret"))
        .header("x-user-id", "mallory")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json("/api/bundles", Some("alice")).await;
    let bundles = body["data"].as_array().unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0]["id"], "secret");
}
