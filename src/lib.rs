// src/lib.rs

pub mod chat;
pub mod config;
pub mod engine;
pub mod llm;
pub mod memory;
pub mod mood;
pub mod persona;
pub mod prompt;
pub mod response;
pub mod sentiment;
pub mod storage;
pub mod suggestions;
pub mod voice;
