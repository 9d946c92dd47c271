pub mod admin;
pub mod auth;
pub mod feedback;
pub mod fields;
pub mod plan;
pub mod profile;
#[cfg(test)]
pub mod test_support;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(plan::router(state.clone()))
        .nest("/admin", admin::router(state.clone()))
        .nest("/api", feedback::router(state))
}
