use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use std::{future::Future, sync::Arc};

use crate::{
    auth::{self, TokenKeys},
    budgets, categories, goals, health,
    oauth::IdentityProvider,
    transactions,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenKeys>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Origin of the web client. Used for CORS and the post-login redirect.
    pub client_url: String,
    pub secure_cookies: bool,
}

fn cors(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);
    match HeaderValue::from_str(client_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(err) => {
            tracing::warn!("invalid client url {client_url}, CORS disabled: {err}");
            layer
        }
    }
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/stats", get(transactions::stats))
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/stats", get(budgets::stats))
        .route(
            "/budgets/{id}",
            get(budgets::get).put(budgets::update).delete(budgets::delete),
        )
        .route("/budgets/{id}/recalculate", put(budgets::recalculate))
        .route("/goals", get(goals::list).post(goals::create))
        .route("/goals/stats", get(goals::stats))
        .route(
            "/goals/{id}",
            get(goals::get).put(goals::update).delete(goals::delete),
        )
        .route("/goals/{id}/progress", put(goals::progress))
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/{id}", axum::routing::delete(categories::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/logout", post(auth::logout));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(cors(&state.client_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

pub async fn run(state: ServerState, bind: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    run_with_listener(state, listener, shutdown_signal()).await
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
