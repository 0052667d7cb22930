//! TERRASMITH LLM - the AI bridge.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint behind the
//! [`terrasmith_dsl::Translator`] seam. The reply is treated as untrusted
//! input: prose and code fences are tolerated, the embedded JSON document
//! is parsed strictly and pushed through the same schema validator as any
//! other candidate. The bridge gives up after a bounded number of attempts
//! and reports a [`terrasmith_core::BridgeError`] value for the compiler
//! front-end to route on.

pub mod bridge;
pub mod client;
pub mod types;

pub use bridge::{OpenAiBridge, MAX_ATTEMPTS};
pub use client::ChatClient;
