use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use ordercopilot_agent::AgentRuntime;
use ordercopilot_core::{ConversationState, DispatchOutput};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Accepted for compatibility with the gateway; not used for dispatch.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatResponse {
    pub output: DispatchOutput,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { runtime })
}

/// Always answers 200; dispatch failures travel as `[ERROR] ...` text.
pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    info!(
        event_name = "http.chat.received",
        user_id = request.user_id.as_deref().unwrap_or("unknown"),
        message_len = request.message.len(),
        "chat request received"
    );

    let final_state = state.runtime.dispatch(ConversationState::seed(request.message)).await;

    Json(ChatResponse { output: final_state.output_or_empty() })
}
