// src/llm/mod.rs
// LLM module exports and submodule declarations

pub mod client;
pub mod provider;

// Export the main client and the provider seam
pub use client::OpenAiClient;
pub use provider::{ChatRole, ChatTurn, LanguageModel};
