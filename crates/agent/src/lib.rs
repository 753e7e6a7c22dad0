//! Agent runtime - model-driven tool dispatch for order management
//!
//! This crate turns one chat message into at most one order API call:
//! - `llm` talks to an OpenAI-compatible chat-completions endpoint
//! - `tools` holds the `Tool` trait and the `ToolRegistry`
//! - `order_tools` defines the ten order operations offered to the model
//! - `orders` is the HTTP client for the order-management API
//! - `runtime` runs the dispatch step and records the outcome
//!
//! # Safety Principle
//!
//! The model only selects a tool and extracts its arguments. Orders are
//! created and changed by the order API; responses are passed back verbatim.

pub mod llm;
pub mod order_tools;
pub mod orders;
pub mod runtime;
pub mod tools;

pub use runtime::{AgentRuntime, DispatchError, RuntimeBuildError};
