use std::sync::Arc;

use ordercopilot_core::config::AppConfig;
use ordercopilot_core::{ApplicationError, ConversationState, DispatchOutput};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, OpenAiCompatibleClient};
use crate::order_tools::order_tool_registry;
use crate::orders::{OrderApiError, OrdersApi};
use crate::tools::{ToolError, ToolRegistry};

pub const SYSTEM_PROMPT: &str = "You are Order Copilot, an AI assistant for order management. \
You help users create, update, read, and delete orders using natural language. \
If the user request is missing required information, ask for it and persist until all required details are provided. \
Once all required information is collected, call the appropriate tool to perform the action. \
List your capabilities if the user asks for help or says 'hi'.";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("model produced malformed arguments for `{tool}`: {source}")]
    MalformedArguments { tool: String, source: serde_json::Error },
}

impl DispatchError {
    pub fn classify(&self) -> ApplicationError {
        match self {
            Self::Llm(LlmError::Status { status: 401 | 403, .. }) => {
                ApplicationError::Configuration(self.to_string())
            }
            Self::Llm(LlmError::Transport(_))
            | Self::Llm(LlmError::Status { .. })
            | Self::Tool(ToolError::OrderApi(_)) => ApplicationError::Integration(self.to_string()),
            Self::Llm(LlmError::MalformedResponse(_))
            | Self::Tool(ToolError::UnknownTool(_))
            | Self::Tool(ToolError::InvalidArguments { .. })
            | Self::MalformedArguments { .. } => ApplicationError::InvalidInput(self.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeBuildError {
    #[error("could not build llm client: {0}")]
    Llm(#[from] LlmError),
    #[error("could not build order api client: {0}")]
    Orders(#[from] OrderApiError),
}

/// One-step dispatcher: ask the model, run the tool it picked, record the
/// outcome in the conversation state.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    system_prompt: String,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self { llm, tools, system_prompt: SYSTEM_PROMPT.to_string() }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RuntimeBuildError> {
        let llm = OpenAiCompatibleClient::from_config(&config.llm)?;
        let orders = OrdersApi::from_config(&config.orders)?;
        Ok(Self::new(Arc::new(llm), order_tool_registry(orders)))
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one dispatch pass. Never fails: errors become an `[ERROR] ...`
    /// text output.
    pub async fn dispatch(&self, state: ConversationState) -> ConversationState {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "agent.dispatch.start",
            correlation_id = %correlation_id,
            last_order_id = ?state.last_order_id,
            "dispatching user message"
        );

        match self.run_step(&state, &correlation_id).await {
            Ok(output) => {
                info!(
                    event_name = "agent.dispatch.completed",
                    correlation_id = %correlation_id,
                    structured = matches!(output, DispatchOutput::Json(_)),
                    "dispatch completed"
                );
                state.with_output(output)
            }
            Err(error) => {
                let classified = error.classify();
                warn!(
                    event_name = "agent.dispatch.failed",
                    correlation_id = %correlation_id,
                    error_class = classified.error_class(),
                    error = %error,
                    "dispatch failed"
                );
                state.with_error(error)
            }
        }
    }

    async fn run_step(
        &self,
        state: &ConversationState,
        correlation_id: &str,
    ) -> Result<DispatchOutput, DispatchError> {
        let request =
            CompletionRequest { messages: self.messages(state), tools: self.tools.definitions() };
        let completion = self.llm.complete(&request).await?;

        let Some(call) = completion.tool_calls.into_iter().next() else {
            return Ok(DispatchOutput::Text(completion.content.unwrap_or_default()));
        };

        info!(
            event_name = "agent.tool.invoke",
            correlation_id = %correlation_id,
            tool = %call.name,
            "executing model-selected tool"
        );
        let arguments = parse_call_arguments(&call.name, &call.arguments)?;
        let result = self.tools.execute(&call.name, arguments).await?;
        Ok(DispatchOutput::Json(result))
    }

    fn messages(&self, state: &ConversationState) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.system_prompt.as_str())];
        if let Some(order_id) = state.last_order_id {
            messages.push(ChatMessage::system(format!(
                "The most recent order the user worked with has ID {order_id}. \
                 Use it when the user refers to \"the order\" or \"it\" without an ID."
            )));
        }
        messages.push(ChatMessage::user(state.user_input.as_str()));
        messages
    }
}

fn parse_call_arguments(tool: &str, raw: &str) -> Result<Value, DispatchError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
        .map_err(|source| DispatchError::MalformedArguments { tool: tool.to_string(), source })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use ordercopilot_core::{ConversationState, DispatchOutput};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{AgentRuntime, DispatchError};
    use crate::llm::{Completion, CompletionRequest, LlmClient, LlmError, ToolCall};
    use crate::order_tools::order_tool_registry;
    use crate::orders::OrdersApi;
    use crate::tools::{ToolError, ToolRegistry};

    /// Replays a fixed completion and records every request it receives.
    struct ScriptedLlm {
        reply: Result<Completion, String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        fn tool_call(name: &str, arguments: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(Completion {
                    content: None,
                    tool_calls: vec![ToolCall {
                        id: "call_1".to_string(),
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn text(content: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(Completion {
                    content: Some(content.to_string()),
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(body: &str) -> Arc<Self> {
            Arc::new(Self { reply: Err(body.to_string()), requests: Mutex::new(Vec::new()) })
        }

        fn recorded(&self) -> Vec<CompletionRequest> {
            self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            self.reply
                .clone()
                .map_err(|body| LlmError::Status { status: 500, body })
        }
    }

    fn runtime(llm: Arc<ScriptedLlm>, server: &MockServer) -> AgentRuntime {
        let api = OrdersApi::new(&server.uri(), Duration::from_secs(5)).expect("client should build");
        AgentRuntime::new(llm, order_tool_registry(api))
    }

    #[tokio::test]
    async fn create_request_issues_exactly_one_post_and_remembers_order() {
        let server = MockServer::start().await;
        let created = json!({"id": 5000, "organization": "Acme Title", "transactionType": "Refinance"});
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_json(json!({"organization": "Acme Title", "transactionType": "Refinance"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(created.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let llm = ScriptedLlm::tool_call(
            "create_order",
            r#"{"organization":"Acme Title","transactionType":"Refinance"}"#,
        );
        let state = runtime(llm.clone(), &server)
            .dispatch(ConversationState::seed(
                "Create a Refinance order for organization Acme Title",
            ))
            .await;

        assert_eq!(state.output, Some(DispatchOutput::Json(created.clone())));
        assert_eq!(state.last_order_id, Some(5000));
        assert_eq!(state.last_order_data, Some(created));

        let requests = llm.recorded();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools.len(), 10);
        assert_eq!(requests[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn text_reply_becomes_text_output() {
        let server = MockServer::start().await;
        let llm = ScriptedLlm::text("Which organization is this order for?");

        let state = runtime(llm, &server).dispatch(ConversationState::seed("create an order")).await;

        assert_eq!(
            state.output,
            Some(DispatchOutput::Text("Which organization is this order for?".to_string()))
        );
        assert_eq!(state.last_order_id, None);
    }

    #[tokio::test]
    async fn delete_no_content_yields_success_output() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orders/5000"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let state = runtime(ScriptedLlm::tool_call("delete_order", r#"{"id":5000}"#), &server)
            .dispatch(ConversationState::seed("delete order 5000"))
            .await;

        assert_eq!(state.output, Some(DispatchOutput::Json(json!({"success": true}))));
    }

    #[tokio::test]
    async fn delete_other_status_yields_failure_output() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orders/9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let state = runtime(ScriptedLlm::tool_call("delete_order", r#"{"id":9}"#), &server)
            .dispatch(ConversationState::seed("delete order 9"))
            .await;

        assert_eq!(
            state.output,
            Some(DispatchOutput::Json(json!({"success": false, "error": "missing"})))
        );
    }

    #[tokio::test]
    async fn failures_become_error_marked_text() {
        let server = MockServer::start().await;
        let cases = [
            ScriptedLlm::failing("upstream exploded"),
            ScriptedLlm::tool_call("create_order", "{not json"),
            ScriptedLlm::tool_call("create_order", r#"{"organization":"Acme Title"}"#),
            ScriptedLlm::tool_call("launch_rocket", "{}"),
        ];

        for llm in cases {
            let state = runtime(llm, &server).dispatch(ConversationState::seed("do it")).await;
            let output = state.output_or_empty();
            assert!(output.is_error(), "expected error output, got {output:?}");
            assert!(output.display_text().starts_with("[ERROR] "));
        }
    }

    #[tokio::test]
    async fn plain_text_rejection_becomes_error_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("Organization and TransactionType are required."),
            )
            .mount(&server)
            .await;
        let llm = ScriptedLlm::tool_call(
            "create_order",
            r#"{"organization":"","transactionType":""}"#,
        );

        let state = runtime(llm, &server).dispatch(ConversationState::seed("new order")).await;

        let output = state.output_or_empty();
        assert!(output.is_error(), "expected error output, got {output:?}");
        assert!(output.display_text().contains("Organization and TransactionType are required."));
        assert_eq!(state.last_order_id, None);
    }

    #[tokio::test]
    async fn empty_update_response_becomes_error_output() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/orders/5000/fees"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let llm = ScriptedLlm::tool_call(
            "add_or_update_fee",
            r#"{"id":5000,"description":"Recording","amount":125.5}"#,
        );

        let state = runtime(llm, &server).dispatch(ConversationState::seed("add a fee")).await;

        let output = state.output_or_empty();
        assert!(output.is_error(), "expected error output, got {output:?}");
        assert_ne!(serde_json::to_value(&output).ok(), Some(serde_json::Value::Null));
    }

    #[tokio::test]
    async fn unreachable_order_api_becomes_error_output() {
        let api = OrdersApi::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client should build");
        let runtime = AgentRuntime::new(
            ScriptedLlm::tool_call("get_all_orders", ""),
            order_tool_registry(api),
        );

        let state = runtime.dispatch(ConversationState::seed("list orders")).await;
        assert!(state.output_or_empty().is_error());
    }

    #[tokio::test]
    async fn remembered_order_is_offered_as_context() {
        let llm = ScriptedLlm::text("Sure.");
        let runtime = AgentRuntime::new(llm.clone(), ToolRegistry::default())
            .with_system_prompt("test prompt");

        let state = ConversationState { last_order_id: Some(5002), ..ConversationState::default() }
            .next_turn("add a buyer named Jane to it");
        runtime.dispatch(state).await;

        let requests = llm.recorded();
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content.as_deref(), Some("test prompt"));
        assert!(messages[1].content.as_deref().unwrap_or_default().contains("5002"));
        assert_eq!(messages[2].role, "user");
        assert!(requests[0].tools.is_empty());
    }

    #[test]
    fn rejected_credentials_classify_as_configuration() {
        let unauthorized =
            DispatchError::Llm(LlmError::Status { status: 401, body: "bad key".to_string() });
        let overloaded =
            DispatchError::Llm(LlmError::Status { status: 503, body: "busy".to_string() });
        let unknown = DispatchError::Tool(ToolError::UnknownTool("launch_rocket".to_string()));

        assert_eq!(unauthorized.classify().error_class(), "config_validation");
        assert_eq!(overloaded.classify().error_class(), "integration");
        assert_eq!(unknown.classify().error_class(), "invalid_input");
    }
}
