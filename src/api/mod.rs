pub mod auth;
pub mod error;
pub mod metrics;
mod parking;
pub mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    // Bearer token checked by the `AuthUser` extractor in each handler
    let api_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/parking", get(parking::get_parking))
        .route("/parking", post(parking::start_parking))
        .route("/capacity", get(parking::get_capacity))
        .route("/reports", post(parking::create_report));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_endpoint))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .merge(crate::ui::create_router())
        .layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::{body::Body, response::Response, Router};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::config::Config;
    use crate::db::testing::temp_db;
    use crate::portal::testing::FixedLabel;
    use crate::AppState;

    /// Full router over a temp database and a classifier that always answers `label`
    pub async fn test_app(label: &'static str) -> (TempDir, Router) {
        let (dir, db) = temp_db().await;
        let state = AppState::new(Config::default(), db, Arc::new(FixedLabel(label)));
        (dir, super::create_router(Arc::new(state)))
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }
}
