//! HTTP API (feature `server`)
//!
//! A JSON REST surface over the same services the CLI uses. Every response is
//! wrapped in an [`ApiResponse`] envelope; authenticated routes take a bearer
//! token issued by `POST /api/auth/login`.

pub mod auth;
pub mod handlers;
pub mod request_tracing;
pub mod response;

use std::sync::{Arc, Mutex, PoisonError};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::settings::Settings;
use crate::error::{FintrackError, FintrackResult};
use crate::storage::Storage;

pub use auth::AuthUser;
pub use response::{ApiError, ApiResponse};

/// Shared state handed to every handler
///
/// Services are synchronous and do read-modify-save sequences on the shared
/// repositories, so handlers go through [`AppState::run`], which serialises
/// them and keeps file IO and password hashing off the async workers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    storage: Storage,
    settings: Settings,
    lock: Mutex<()>,
}

impl AppState {
    pub fn new(storage: Storage, settings: Settings) -> Self {
        Self {
            inner: Arc::new(Shared {
                storage,
                settings,
                lock: Mutex::new(()),
            }),
        }
    }

    /// Run `f` on the blocking pool while holding the service lock
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Storage, &Settings) -> FintrackResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            // The mutex guards no data, so poisoning is ignored
            let _guard = state
                .inner
                .lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            f(state.storage(), state.settings())
        })
        .await
        .map_err(|e| FintrackError::Storage(format!("Request task failed: {}", e)))?
        .map_err(ApiError::from)
    }

    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    use handlers::{budgets, categories, family, goals, insights, liabilities, transactions};

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/categories", get(categories::list).post(categories::create))
        .route("/transactions", get(transactions::list).post(transactions::create))
        .route("/transactions/summary", get(transactions::summary))
        .route(
            "/transactions/:id",
            get(transactions::show)
                .put(transactions::update)
                .delete(transactions::remove),
        )
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/overview", get(budgets::overview))
        .route("/budgets/alerts", get(budgets::alerts))
        .route("/budgets/transfer", post(budgets::transfer))
        .route("/budgets/:id", put(budgets::update).delete(budgets::remove))
        .route("/goals", get(goals::list).post(goals::create))
        .route("/goals/:id/contributions", post(goals::contribute))
        .route("/goals/:id", delete(goals::remove))
        .route("/liabilities", get(liabilities::list).post(liabilities::create))
        .route("/liabilities/:id/payments", post(liabilities::pay))
        .route("/liabilities/:id/payoff", get(liabilities::payoff))
        .route("/liabilities/:id", delete(liabilities::remove))
        .route("/family", get(family::show).post(family::create))
        .route("/family/invitations", get(family::invitations).post(family::invite))
        .route("/family/invitations/:id/accept", post(family::accept))
        .route("/family/invitations/:id/decline", post(family::decline))
        .route("/family/members/:user_id", delete(family::remove_member))
        .route("/family/leave", post(family::leave))
        .route("/insights/anomalies", get(insights::anomalies))
        .route("/insights/trends", get(insights::trends))
        .route("/insights/clusters", get(insights::clusters))
        .route("/insights/health", get(insights::health));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(
                    request_tracing::request_tracing_middleware,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Serve the API on `bind` until the process is interrupted
pub async fn serve(storage: Storage, settings: Settings, bind: &str) -> FintrackResult<()> {
    let state = AppState::new(storage, settings);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| FintrackError::Config(format!("Cannot bind {}: {}", bind, e)))?;
    tracing::info!(address = %bind, "fintrack API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("fintrack API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::paths::FintrackPaths;
    use crate::services::testing::create_test_storage;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router, username: &str) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "identifier": username, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_auth_required() {
        let (_temp_dir, storage) = create_test_storage();
        let app = router(AppState::new(storage, Settings::default()));

        let (status, body) = call(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");

        let (status, body) = call(&app, Method::GET, "/api/transactions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) =
            call(&app, Method::GET, "/api/auth/me", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_transaction_and_budget_flow() {
        let (_temp_dir, storage) = create_test_storage();
        let app = router(AppState::new(storage, Settings::default()));
        let token = login(&app, "alice").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/transactions",
            Some(&token),
            Some(json!({ "amount": 4250, "category": "Groceries", "date": "2025-03-04" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/transactions/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["amount"], 4250);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/budgets",
            Some(&token),
            Some(json!({ "category": "Groceries", "limit": 40000, "month": "2025-03" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/budgets/overview?month=2025-03",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totals"]["spent"], 4250);

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/transactions?month=March",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_users_records_are_hidden() {
        let (_temp_dir, storage) = create_test_storage();
        let app = router(AppState::new(storage, Settings::default()));
        let alice = login(&app, "alice").await;
        let bob = login(&app, "bob").await;

        let (_, body) = call(
            &app,
            Method::POST,
            "/api/goals",
            Some(&alice),
            Some(json!({ "name": "Bike", "target_amount": 50000 })),
        )
        .await;
        let goal_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/api/goals/{}", goal_id),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::GET, "/api/family", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_contributions_all_land() {
        let (temp_dir, storage) = create_test_storage();
        let app = router(AppState::new(storage, Settings::default()));
        let token = login(&app, "alice").await;

        let (_, body) = call(
            &app,
            Method::POST,
            "/api/goals",
            Some(&token),
            Some(json!({ "name": "Trip", "target_amount": 1_000_000 })),
        )
        .await;
        let goal_id = body["data"]["id"].as_str().unwrap().to_string();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let app = app.clone();
            let token = token.clone();
            let uri = format!("/api/goals/{}/contributions", goal_id);
            tasks.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let (status, _) = call(
                        &app,
                        Method::POST,
                        &uri,
                        Some(&token),
                        Some(json!({ "amount": 100, "date": "2025-03-01" })),
                    )
                    .await;
                    assert_eq!(status, StatusCode::OK);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let (_, body) = call(&app, Method::GET, "/api/goals", Some(&token), None).await;
        assert_eq!(body["data"][0]["saved_amount"], 8_000);
        assert_eq!(body["data"][0]["contributions"].as_array().unwrap().len(), 80);

        // Disk agrees with memory
        let reopened = Storage::open(FintrackPaths::with_base_dir(temp_dir.path().to_path_buf()))
            .unwrap();
        let goals = reopened.goals.all().unwrap();
        assert_eq!(goals[0].saved_amount.cents(), 8_000);
        assert_eq!(goals[0].contributions.len(), 80);
    }

    #[tokio::test]
    async fn test_out_of_range_queries_are_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let app = router(AppState::new(storage, Settings::default()));
        let token = login(&app, "alice").await;

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/transactions/summary?month=300000-01",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/insights/trends?month=2025-03&months=3000000000",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/insights/trends?month=2025-03&months=12",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
