// src/prompt/mod.rs
// Prompt building module

pub mod builder;

pub use builder::{build_chat_turns, build_system_prompt, PromptContext};
