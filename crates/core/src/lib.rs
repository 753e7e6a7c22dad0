pub mod config;
pub mod domain;
pub mod errors;
pub mod state;

pub use domain::order::{AmountLine, Loan, NewOrder, OrderId, Party, Service};
pub use errors::ApplicationError;
pub use state::{ConversationState, DispatchOutput, ERROR_MARKER};
