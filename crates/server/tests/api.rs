use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Engine, ExternalProfile};
use migration::MigratorTrait;
use server::{IdentityProvider, SESSION_COOKIE, ServerError, ServerState, TokenKeys};

const CLIENT_URL: &str = "http://localhost:5173";

struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> Result<String, ServerError> {
        Ok(format!("https://idp.test/auth?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ServerError> {
        if code == "bad" {
            return Err(ServerError::Unauthorized("code rejected".to_string()));
        }
        Ok(ExternalProfile {
            external_id: format!("ext-{code}"),
            name: code.to_string(),
            email: format!("{code}@example.com"),
        })
    }
}

struct TestApp {
    router: Router,
    engine: Arc<Engine>,
    tokens: Arc<TokenKeys>,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
        let tokens = Arc::new(TokenKeys::new(b"test-secret", Duration::days(30)));
        let state = ServerState {
            engine: engine.clone(),
            tokens: tokens.clone(),
            identity: Arc::new(FakeProvider),
            client_url: CLIENT_URL.to_string(),
            secure_cookies: false,
        };
        Self {
            router: server::router(state),
            engine,
            tokens,
        }
    }

    async fn sign_in(&self, name: &str) -> (Uuid, String) {
        let user = self
            .engine
            .sign_in_external(ExternalProfile {
                external_id: format!("ext-{name}"),
                name: name.to_string(),
                email: format!("{name}@example.com"),
            })
            .await
            .unwrap();
        let token = self.tokens.issue(user.id).unwrap();
        (user.id, token)
    }

    async fn raw(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.raw(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn food_budget() -> Value {
    json!({
        "name": "Groceries",
        "category": "Food",
        "limitMinor": 10000,
        "startDate": "2026-03-01",
        "endDate": "2026-03-31"
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Server is running!");
    assert!(body["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send("GET", "/api/transactions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let (status, _) = app
        .send("GET", "/api/budgets", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = app.tokens.issue(Uuid::new_v4()).unwrap();
    let (status, _) = app.send("GET", "/api/goals", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.raw(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn transactions_crud_and_pagination() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    for day in 1..=12 {
        let (status, body) = app
            .send(
                "POST",
                "/api/transactions",
                Some(&token),
                Some(json!({
                    "type": "expense",
                    "amountMinor": 1000 + day,
                    "description": "Lunch",
                    "category": "Food",
                    "date": format!("2026-03-{day:02}")
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["type"], "expense");
    }

    let (status, body) = app
        .send("GET", "/api/transactions?page=2&limit=5", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 12);
    assert_eq!(body["pagination"]["pages"], 3);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][0]["amountMinor"], 1007);

    let (_, body) = app
        .send(
            "GET",
            "/api/transactions?startDate=2026-04-01&endDate=2026-03-01",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], 0);

    let id = body_json_id(&app, &token).await;
    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/transactions/{id}"),
            Some(&token),
            Some(json!({ "description": "Dinner" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Dinner");

    let (status, _) = app
        .send("DELETE", &format!("/api/transactions/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .send("GET", &format!("/api/transactions/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

async fn body_json_id(app: &TestApp, token: &str) -> String {
    let (_, body) = app
        .send("GET", "/api/transactions?limit=1", Some(token), None)
        .await;
    body["data"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn malformed_requests_are_400_and_bad_ids_404() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/transactions")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.raw(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);

    let (status, body) = app
        .send(
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({ "type": "expense", "amountMinor": 0, "description": "x", "category": "Food" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "amount must be greater than 0");

    let (status, _) = app
        .send("GET", "/api/transactions?startDate=soon", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("GET", "/api/budgets/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expenses_feed_budgets_and_recalculation_reverts() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    let (status, body) = app
        .send("POST", "/api/budgets", Some(&token), Some(food_budget()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["alertThreshold"], 80.0);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, tx) = app
        .send(
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({
                "type": "expense",
                "amountMinor": 15000,
                "description": "Big shop",
                "category": "Food",
                "date": "2026-03-10"
            })),
        )
        .await;
    let tx_id = tx["data"]["id"].as_str().unwrap().to_string();
    app.send(
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "type": "income",
            "amountMinor": 99999,
            "description": "Refund",
            "category": "Food",
            "date": "2026-03-11"
        })),
    )
    .await;

    let (_, body) = app
        .send("GET", &format!("/api/budgets/{id}"), Some(&token), None)
        .await;
    assert_eq!(body["data"]["spentMinor"], 15000);
    assert_eq!(body["data"]["status"], "exceeded");
    assert_eq!(body["data"]["usagePercentage"], 100.0);
    assert_eq!(body["data"]["remainingMinor"], 0);
    assert_eq!(body["data"]["isExceeded"], true);
    assert_eq!(body["data"]["isInAlert"], true);

    app.send(
        "DELETE",
        &format!("/api/transactions/{tx_id}"),
        Some(&token),
        None,
    )
    .await;
    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/budgets/{id}/recalculate"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["spentMinor"], 0);
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = app
        .send("GET", "/api/budgets/stats", Some(&token), None)
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["averageUsage"], 0.0);
}

#[tokio::test]
async fn budget_create_reports_missing_field() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    let mut payload = food_budget();
    payload.as_object_mut().unwrap().remove("endDate");
    let (status, body) = app
        .send("POST", "/api/budgets", Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "endDate is required");
}

#[tokio::test]
async fn records_of_other_owners_are_not_found() {
    let app = TestApp::new().await;
    let (_, alice) = app.sign_in("alice").await;
    let (_, bob) = app.sign_in("bob").await;

    let (_, body) = app
        .send("POST", "/api/budgets", Some(&alice), Some(food_budget()))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for (method, uri) in [
        ("GET", format!("/api/budgets/{id}")),
        ("DELETE", format!("/api/budgets/{id}")),
        ("PUT", format!("/api/budgets/{id}/recalculate")),
    ] {
        let (status, _) = app.send(method, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    }

    let (status, _) = app
        .send("GET", &format!("/api/budgets/{id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn goal_progress_validation_and_completion() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/goals",
            Some(&token),
            Some(json!({
                "title": "Bike",
                "type": "saving",
                "targetMinor": 50000,
                "targetDate": "2026-12-31"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["priority"], "medium");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/goals/{id}/progress");

    for bad in [json!("abc"), json!(12.5), json!(-1), Value::Null] {
        let (status, body) = app
            .send("PUT", &uri, Some(&token), Some(json!({ "amountMinor": bad })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(body["success"], false);
    }

    let (_, body) = app
        .send("PUT", &uri, Some(&token), Some(json!({ "amountMinor": 50000 })))
        .await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["progress"], 100.0);

    let (_, body) = app
        .send("PUT", &uri, Some(&token), Some(json!({ "amountMinor": 100 })))
        .await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["currentMinor"], 100);

    let (_, body) = app.send("GET", "/api/goals/stats", Some(&token), None).await;
    assert_eq!(body["data"]["completed"], 1);
}

#[tokio::test]
async fn categories_are_seeded_and_unique() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    let (_, body) = app
        .send("GET", "/api/categories?type=income", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let (status, _) = app
        .send(
            "POST",
            "/api/categories",
            Some(&token),
            Some(json!({ "name": "salary", "type": "income" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            "POST",
            "/api/categories",
            Some(&token),
            Some(json!({ "name": "Gifts", "type": "income", "icon": "🎁" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isDefault"], false);
    assert_eq!(body["data"]["color"], "#6b7280");
}

#[tokio::test]
async fn transaction_stats_endpoint() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_in("alice").await;

    for (kind, amount, category) in [
        ("income", 300000, "Salary"),
        ("expense", 40000, "Food"),
        ("expense", 20000, "Transport"),
    ] {
        app.send(
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({
                "type": kind,
                "amountMinor": amount,
                "description": category,
                "category": category,
                "date": "2026-03-05"
            })),
        )
        .await;
    }

    let (status, body) = app
        .send(
            "GET",
            "/api/transactions/stats?startDate=2026-03-01&endDate=2026-03-31",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["income"], 300000);
    assert_eq!(body["data"]["expense"], 60000);
    assert_eq!(body["data"]["balance"], 240000);
    assert_eq!(body["data"]["categoryBreakdown"]["expense"][0]["category"], "Food");
    assert_eq!(body["data"]["categoryBreakdown"]["expense"][0]["count"], 1);
}

#[tokio::test]
async fn google_flow_issues_session() {
    let app = TestApp::new().await;

    let response = app
        .raw(
            Request::builder()
                .uri("/api/auth/google")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response.status().is_redirection());
    let consent = location(&response);
    assert!(consent.starts_with("https://idp.test/auth?state="));
    let state = consent.rsplit('=').next().unwrap().to_string();
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("fintrack_oauth_state="))
    );

    let response = app
        .raw(
            Request::builder()
                .uri(format!("/api/auth/google/callback?code=carol&state={state}"))
                .header(header::COOKIE, format!("fintrack_oauth_state={state}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response.status().is_redirection());
    let target = location(&response);
    assert!(target.starts_with(&format!("{CLIENT_URL}/login?token=")));
    assert!(target.contains("user="));

    let session = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{SESSION_COOKIE}=")))
        .unwrap();
    let token = session
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches(&format!("{SESSION_COOKIE}="))
        .to_string();
    let (status, body) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "carol@example.com");
}

#[tokio::test]
async fn google_callback_failures_redirect_with_error() {
    let app = TestApp::new().await;

    for uri in [
        "/api/auth/google/callback?code=carol&state=forged",
        "/api/auth/google/callback?code=bad&state=expected",
        "/api/auth/google/callback?error=access_denied",
    ] {
        let response = app
            .raw(
                Request::builder()
                    .uri(uri)
                    .header(header::COOKIE, "fintrack_oauth_state=expected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert!(response.status().is_redirection(), "{uri}");
        let target = location(&response);
        assert!(target.starts_with(&format!("{CLIENT_URL}/login?error=")), "{target}");
    }
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = TestApp::new().await;
    let response = app
        .raw(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, format!("{SESSION_COOKIE}=whatever"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with(&format!("{SESSION_COOKIE}=")) && c.contains("Max-Age=0"))
    );
    assert_eq!(body_json(response).await["message"], "Logout successful");
}
