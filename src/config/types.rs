//! Resolved, strongly-typed configuration consumed by the rest of the crate.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub wss_url: String,
    pub bot_token: String,
    pub commands_prefix: String,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub ripple_api_base: String,
    pub ripple_api_token: String,
    pub bancho_api_base: String,
    pub bancho_api_token: String,
    pub lets_api_base: String,
    pub cheesegull_api_base: String,
    pub osu_api_base: String,
    pub osu_api_key: String,
    pub beatconnect_api_base: String,
    pub misirlou_api_base: String,
    pub misirlou_api_token: String,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PubSubConfig {
    pub redis_url: String,
}

#[derive(Debug, Clone)]
pub struct InternalApiConfig {
    pub secret: String,
    pub bind_addr: String,
}

#[derive(Debug, Clone)]
pub struct FaqStoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub bot_plugins: Vec<String>,

    pub chat: ChatConfig,
    pub backend: BackendConfig,
    pub pubsub: PubSubConfig,
    pub internal_api: InternalApiConfig,
    pub faq_store: FaqStoreConfig,
}

#[cfg(test)]
impl Config {
    /// Convenience constructor for unit tests elsewhere in the crate.
    pub fn test_default() -> Self {
        Self {
            bot_name: "fokabot".into(),
            log_level: "info".into(),
            bot_plugins: vec![],
            chat: ChatConfig {
                wss_url: "wss://c.example.test/".into(),
                bot_token: "test-token".into(),
                commands_prefix: "!".into(),
            },
            backend: BackendConfig {
                ripple_api_base: "https://ripple.example.test".into(),
                ripple_api_token: "rt".into(),
                bancho_api_base: "https://bancho.example.test".into(),
                bancho_api_token: "bt".into(),
                lets_api_base: "https://lets.example.test".into(),
                cheesegull_api_base: "https://cheesegull.example.test".into(),
                osu_api_base: "https://osu.example.test".into(),
                osu_api_key: "ok".into(),
                beatconnect_api_base: "https://beatconnect.example.test".into(),
                misirlou_api_base: "https://misirlou.example.test".into(),
                misirlou_api_token: "mt".into(),
                http_timeout: Duration::from_secs(5),
            },
            pubsub: PubSubConfig { redis_url: "redis://127.0.0.1/".into() },
            internal_api: InternalApiConfig {
                secret: "secret".into(),
                bind_addr: "127.0.0.1:9001".into(),
            },
            faq_store: FaqStoreConfig { path: PathBuf::from("./faq.test.json") },
        }
    }
}
