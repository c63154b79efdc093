use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = match &state.db_pool {
        Some(pool) => {
            // Bounded so the probe answers quickly even when the first
            // connection hangs on DNS or TLS.
            match tokio::time::timeout(
                Duration::from_secs(3),
                sqlx::query("SELECT 1").fetch_one(pool),
            )
            .await
            {
                Ok(Ok(_)) => true,
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "Health check query failed");
                    false
                }
                Err(_) => {
                    tracing::error!("Health check query timed out");
                    false
                }
            }
        }
        // No database configured; report healthy so the process itself can
        // still be probed.
        None => true,
    };

    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "app": state.config.app_name,
        "now": Utc::now().to_rfc3339(),
        "db": db_ok,
    }))
}
