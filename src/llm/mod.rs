//! Chat-completions client used by the live suggestion provider.

mod client;
mod types;

pub use client::LlmClient;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice, MessageRole, ResponseMessage, Usage};
