use axum::{Json, extract::State};
use std::sync::Arc;

use crate::health::{self, HealthReport};
use crate::state::AppState;

// Gateway health: probes every configured upstream and reports the
// composite status.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(
        health::check_services(&state.client, state.routes.routes(), state.health_timeout)
            .await,
    )
}
