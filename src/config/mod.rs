// src/config/mod.rs
// All tunables load from the environment (with .env support), one place only.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AttuneConfig {
    // ── OpenAI Configuration
    pub openai_base_url: String,
    pub model: String,
    pub max_reply_tokens: usize,
    pub reply_temperature: f32,
    pub classify_temperature: f32,
    pub translate_temperature: f32,
    pub request_timeout: u64,

    // ── Database Configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Conversation Configuration
    pub history_turn_cap: usize,
    pub similar_context_k: usize,
    pub question_mining_k: usize,
    pub default_language: String,
    pub title_max_chars: usize,

    // ── Speech Configuration
    pub tts_model: String,
    pub tts_voice: String,

    // ── Logging Configuration
    pub log_level: String,
}

// Handles values with trailing comments and extra whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl AttuneConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists
        let _ = dotenvy::dotenv();

        Self {
            openai_base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com/v1".to_string()),
            model: env_var_or("ATTUNE_MODEL", "gpt-4o-mini".to_string()),
            max_reply_tokens: env_var_or("ATTUNE_MAX_REPLY_TOKENS", 1000),
            reply_temperature: env_var_or("ATTUNE_REPLY_TEMPERATURE", 0.7),
            classify_temperature: env_var_or("ATTUNE_CLASSIFY_TEMPERATURE", 0.1),
            translate_temperature: env_var_or("ATTUNE_TRANSLATE_TEMPERATURE", 0.3),
            request_timeout: env_var_or("ATTUNE_REQUEST_TIMEOUT", 30),
            database_url: env_var_or("DATABASE_URL", "sqlite:./attune.db?mode=rwc".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),
            history_turn_cap: env_var_or("ATTUNE_HISTORY_TURN_CAP", 8),
            similar_context_k: env_var_or("ATTUNE_SIMILAR_CONTEXT_K", 5),
            question_mining_k: env_var_or("ATTUNE_QUESTION_MINING_K", 3),
            default_language: env_var_or("ATTUNE_DEFAULT_LANGUAGE", "en".to_string()),
            title_max_chars: env_var_or("ATTUNE_TITLE_MAX_CHARS", 50),
            tts_model: env_var_or("ATTUNE_TTS_MODEL", "tts-1".to_string()),
            tts_voice: env_var_or("ATTUNE_TTS_VOICE", "alloy".to_string()),
            log_level: env_var_or("ATTUNE_LOG_LEVEL", "info".to_string()),
        }
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<AttuneConfig> = Lazy::new(AttuneConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AttuneConfig::from_env();

        assert_eq!(config.history_turn_cap, 8);
        assert_eq!(config.similar_context_k, 5);
        assert_eq!(config.default_language, "en");
        assert_eq!(config.tts_voice, "alloy");
    }

    #[test]
    fn test_env_var_or_strips_inline_comment() {
        unsafe { std::env::set_var("ATTUNE_TEST_VALUE", "42 # turn cap") };
        let parsed: usize = env_var_or("ATTUNE_TEST_VALUE", 0);
        unsafe { std::env::remove_var("ATTUNE_TEST_VALUE") };
        assert_eq!(parsed, 42);
    }
}
