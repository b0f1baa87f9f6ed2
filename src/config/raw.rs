//! Wire shape of configuration: every field as read straight from the
//! environment, before parsing/defaulting (mirrors the teacher's
//! `config::raw` / `config::types` split).

use std::env;

#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub bot_name: Option<String>,
    pub log_level: Option<String>,
    pub commands_prefix: Option<String>,

    pub wss: Option<String>,
    pub bot_token: Option<String>,

    pub ripple_api_base: Option<String>,
    pub ripple_api_token: Option<String>,
    pub bancho_api_base: Option<String>,
    pub bancho_api_token: Option<String>,
    pub lets_api_base: Option<String>,
    pub cheesegull_api_base: Option<String>,
    pub osu_api_base: Option<String>,
    pub osu_api_key: Option<String>,
    pub beatconnect_api_base: Option<String>,
    pub misirlou_api_base: Option<String>,
    pub misirlou_api_token: Option<String>,

    pub redis_url: Option<String>,

    pub faq_store_path: Option<String>,

    pub internal_api_secret: Option<String>,
    pub internal_api_bind: Option<String>,

    pub http_timeout_seconds: Option<String>,

    pub bot_plugins: Option<String>,
}

impl RawConfig {
    pub fn from_env() -> Self {
        Self {
            bot_name: env::var("BOT_NAME").ok(),
            log_level: env::var("LOG_LEVEL").ok(),
            commands_prefix: env::var("COMMANDS_PREFIX").ok(),

            wss: env::var("WSS").ok(),
            bot_token: env::var("BOT_TOKEN").ok(),

            ripple_api_base: env::var("RIPPLE_API_BASE").ok(),
            ripple_api_token: env::var("RIPPLE_API_TOKEN").ok(),
            bancho_api_base: env::var("BANCHO_API_BASE").ok(),
            bancho_api_token: env::var("BANCHO_API_TOKEN").ok(),
            lets_api_base: env::var("LETS_API_BASE").ok(),
            cheesegull_api_base: env::var("CHEESEGULL_API_BASE").ok(),
            osu_api_base: env::var("OSU_API_BASE").ok(),
            osu_api_key: env::var("OSU_API_KEY").ok(),
            beatconnect_api_base: env::var("BEATCONNECT_API_BASE").ok(),
            misirlou_api_base: env::var("MISIRLOU_API_BASE").ok(),
            misirlou_api_token: env::var("MISIRLOU_API_TOKEN").ok(),

            redis_url: env::var("REDIS_URL").ok(),

            faq_store_path: env::var("TINYDB_PATH").ok(),

            internal_api_secret: env::var("INTERNAL_API_SECRET").ok(),
            internal_api_bind: env::var("INTERNAL_API_BIND").ok(),

            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS").ok(),

            bot_plugins: env::var("BOT_PLUGINS").ok(),
        }
    }
}
