use std::sync::Arc;

use ordercopilot_agent::orders::{OrderApiError, OrdersApi};
use ordercopilot_agent::{AgentRuntime, RuntimeBuildError};
use ordercopilot_core::config::AppConfig;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub agent_runtime: Arc<AgentRuntime>,
    pub orders: OrdersApi,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Runtime(#[from] RuntimeBuildError),
    #[error("order api client setup failed: {0}")]
    Orders(#[from] OrderApiError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        orders_base_url = %config.orders.base_url,
        "starting application bootstrap"
    );

    let agent_runtime = Arc::new(AgentRuntime::from_config(&config)?);
    let orders = OrdersApi::from_config(&config.orders)?;
    info!(
        event_name = "system.bootstrap.tools_registered",
        correlation_id = "bootstrap",
        tool_count = agent_runtime.tools().len(),
        "order tools registered"
    );

    Ok(Application { config, agent_runtime, orders })
}
