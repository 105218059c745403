//! LLM integration module.
//!
//! Provides an OpenAI-compatible chat client, a plain completion client for
//! locally served models, and the prompts used for answering and scoring.

mod client;
mod completion;
mod prompts;

pub use client::{ContentPart, LlmClient, Message, MessageContent, Role};
pub use completion::CompletionClient;
pub use prompts::{Prompts, USER_QUERY_MARKER};
