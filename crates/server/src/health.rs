use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use ordercopilot_agent::orders::OrdersApi;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    orders: OrdersApi,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub orders_api: HealthCheck,
    pub checked_at: String,
}

pub fn router(orders: OrdersApi) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { orders })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let orders_api = orders_api_check(&state.orders).await;
    let ready = orders_api.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "ordercopilot-server runtime initialized".to_string(),
        },
        orders_api,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn orders_api_check(orders: &OrdersApi) -> HealthCheck {
    match orders.probe().await {
        Ok(status) if status.is_success() => HealthCheck {
            status: "ready",
            detail: format!("GET {} returned {status}", orders.orders_url()),
        },
        Ok(status) => HealthCheck {
            status: "degraded",
            detail: format!("GET {} returned {status}", orders.orders_url()),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("order api unreachable: {error}") }
        }
    }
}
