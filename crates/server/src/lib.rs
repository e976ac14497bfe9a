use api_types::ApiResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use auth::{SESSION_COOKIE, TokenKeys};
pub use oauth::{GoogleConfig, GoogleProvider, IdentityProvider};
pub use server::{ServerState, router, run, run_with_listener, shutdown_signal};

mod auth;
mod budgets;
mod categories;
mod dates;
mod extract;
mod goals;
mod health;
mod oauth;
mod server;
mod transactions;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request: bad JSON, query string or field value.
    Validation(String),
    Unauthorized(String),
    Generic(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Engine(err) => write!(f, "{err}"),
            ServerError::Validation(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::Generic(msg) => f.write_str(msg),
        }
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ServerError::Engine(err) => status_for_engine_error(err),
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!("request failed: {message}");
        }

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_400() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_database_maps_to_500() {
        let err = sea_orm::DbErr::Custom("disk full".to_string());
        let res = ServerError::from(EngineError::Database(err)).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized("no token".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn generic_maps_to_500() {
        let res = ServerError::Generic("boom".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
