//! Per-request conversation state.
//!
//! A state value is owned by exactly one request (or one CLI turn). Dispatch
//! consumes it and hands back a new value with `output` filled in, so nothing
//! mutable is shared between concurrent requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ERROR_MARKER: &str = "[ERROR]";

/// What a dispatch pass produced: model text or a tool's JSON response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchOutput {
    Text(String),
    Json(Value),
}

impl DispatchOutput {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::Text(format!("{ERROR_MARKER} {message}"))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Text(text) if text.starts_with(ERROR_MARKER))
    }

    /// Renders the output for a terminal: text as-is, JSON compactly.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub last_order_id: Option<i64>,
    pub last_order_data: Option<Value>,
    pub user_input: String,
    pub output: Option<DispatchOutput>,
}

impl ConversationState {
    pub fn seed(user_input: impl Into<String>) -> Self {
        Self { user_input: user_input.into(), ..Self::default() }
    }

    /// Starts the next turn, keeping the remembered order and dropping the
    /// previous output.
    pub fn next_turn(self, user_input: impl Into<String>) -> Self {
        Self {
            last_order_id: self.last_order_id,
            last_order_data: self.last_order_data,
            user_input: user_input.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: DispatchOutput) -> Self {
        if let DispatchOutput::Json(value) = &output {
            if let Some(order_id) = order_id_of(value) {
                self.last_order_id = Some(order_id);
                self.last_order_data = Some(value.clone());
            }
        }
        self.output = Some(output);
        self
    }

    pub fn with_error(self, message: impl std::fmt::Display) -> Self {
        self.with_output(DispatchOutput::error(message))
    }

    pub fn output_or_empty(&self) -> DispatchOutput {
        self.output.clone().unwrap_or_else(|| DispatchOutput::Text(String::new()))
    }
}

fn order_id_of(value: &Value) -> Option<i64> {
    match value.as_object()?.get("id")? {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}
