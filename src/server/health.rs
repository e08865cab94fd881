use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness only; answers the same whether or not a pipeline run is active.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "skilltrend engine is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
