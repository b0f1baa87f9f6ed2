//! Loads `Config` from the environment (spec §6), applying defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

use super::raw::RawConfig;
use super::types::{BackendConfig, ChatConfig, Config, FaqStoreConfig, InternalApiConfig, PubSubConfig};

fn require(raw: Option<String>, var_name: &str) -> Result<String, AppError> {
    raw.filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Config(format!("missing required env var {var_name}")))
}

fn default_or(raw: Option<String>, default: &str) -> String {
    raw.filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_bot_plugins(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load() -> Result<Config, AppError> {
    load_from(RawConfig::from_env())
}

fn load_from(raw: RawConfig) -> Result<Config, AppError> {
    let http_timeout_seconds: u64 = raw
        .http_timeout_seconds
        .as_deref()
        .map(|s| s.parse().map_err(|_| AppError::Config("HTTP_TIMEOUT_SECONDS must be a positive integer".into())))
        .transpose()?
        .unwrap_or(5);

    Ok(Config {
        bot_name: default_or(raw.bot_name, "fokabot"),
        log_level: default_or(raw.log_level, "info"),
        bot_plugins: parse_bot_plugins(raw.bot_plugins),

        chat: ChatConfig {
            wss_url: require(raw.wss, "WSS")?,
            bot_token: require(raw.bot_token, "BOT_TOKEN")?,
            commands_prefix: default_or(raw.commands_prefix, "!"),
        },
        backend: BackendConfig {
            ripple_api_base: require(raw.ripple_api_base, "RIPPLE_API_BASE")?,
            ripple_api_token: require(raw.ripple_api_token, "RIPPLE_API_TOKEN")?,
            bancho_api_base: require(raw.bancho_api_base, "BANCHO_API_BASE")?,
            bancho_api_token: require(raw.bancho_api_token, "BANCHO_API_TOKEN")?,
            lets_api_base: require(raw.lets_api_base, "LETS_API_BASE")?,
            cheesegull_api_base: require(raw.cheesegull_api_base, "CHEESEGULL_API_BASE")?,
            osu_api_base: require(raw.osu_api_base, "OSU_API_BASE")?,
            osu_api_key: require(raw.osu_api_key, "OSU_API_KEY")?,
            beatconnect_api_base: require(raw.beatconnect_api_base, "BEATCONNECT_API_BASE")?,
            misirlou_api_base: require(raw.misirlou_api_base, "MISIRLOU_API_BASE")?,
            misirlou_api_token: require(raw.misirlou_api_token, "MISIRLOU_API_TOKEN")?,
            http_timeout: Duration::from_secs(http_timeout_seconds),
        },
        pubsub: PubSubConfig { redis_url: require(raw.redis_url, "REDIS_URL")? },
        internal_api: InternalApiConfig {
            secret: require(raw.internal_api_secret, "INTERNAL_API_SECRET")?,
            bind_addr: default_or(raw.internal_api_bind, "127.0.0.1:9001"),
        },
        faq_store: FaqStoreConfig {
            path: PathBuf::from(default_or(raw.faq_store_path, "./faq.json")),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_raw() -> RawConfig {
        RawConfig {
            bot_name: Some("fokabot-test".into()),
            log_level: Some("debug".into()),
            commands_prefix: None,
            wss: Some("wss://c.example.test/".into()),
            bot_token: Some("tok".into()),
            ripple_api_base: Some("https://ripple.example.test".into()),
            ripple_api_token: Some("rt".into()),
            bancho_api_base: Some("https://bancho.example.test".into()),
            bancho_api_token: Some("bt".into()),
            lets_api_base: Some("https://lets.example.test".into()),
            cheesegull_api_base: Some("https://cheesegull.example.test".into()),
            osu_api_base: Some("https://osu.example.test".into()),
            osu_api_key: Some("ok".into()),
            beatconnect_api_base: Some("https://beatconnect.example.test".into()),
            misirlou_api_base: Some("https://misirlou.example.test".into()),
            misirlou_api_token: Some("mt".into()),
            redis_url: Some("redis://127.0.0.1/".into()),
            faq_store_path: None,
            internal_api_secret: Some("s3cret".into()),
            internal_api_bind: None,
            http_timeout_seconds: None,
            bot_plugins: Some("ban, silence,, alert".into()),
        }
    }

    #[test]
    fn loads_with_defaults_applied() {
        let cfg = load_from(filled_raw()).unwrap();
        assert_eq!(cfg.bot_name, "fokabot-test");
        assert_eq!(cfg.chat.commands_prefix, "!");
        assert_eq!(cfg.faq_store.path, PathBuf::from("./faq.json"));
        assert_eq!(cfg.internal_api.bind_addr, "127.0.0.1:9001");
        assert_eq!(cfg.backend.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bot_plugins_trims_and_drops_empty() {
        let cfg = load_from(filled_raw()).unwrap();
        assert_eq!(cfg.bot_plugins, vec!["ban", "silence", "alert"]);
    }

    #[test]
    fn missing_wss_errors() {
        let mut raw = filled_raw();
        raw.wss = None;
        let err = load_from(raw).unwrap_err();
        assert!(err.to_string().contains("WSS"));
    }

    #[test]
    fn bad_timeout_errors() {
        let mut raw = filled_raw();
        raw.http_timeout_seconds = Some("not-a-number".into());
        assert!(load_from(raw).is_err());
    }
}
