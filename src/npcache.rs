//! Now-playing cache (spec §9): a Redis-backed, per-client TTL cache that
//! remembers the beatmap/mode/mods from the last `/np` action message, so
//! `!with`/`!acc`/`!mode` can recompute pp against it. Grounded on
//! `original_source/plugins/pp.py`'s `save_np_info`/`resolve_np_info`
//! (`fokabot:np:<api_identifier>`, JSON body, 180s expiry).

use serde::{Deserialize, Serialize};

use crate::commands::well_known::GameMode;
use crate::error::AppError;

const NP_CACHE_TTL_SECS: u64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpInfo {
    pub beatmap_id: i64,
    pub game_mode: u8,
    pub mods: u32,
    pub accuracy: Option<f64>,
}

impl NpInfo {
    pub fn new(beatmap_id: i64, game_mode: GameMode, mods: u32) -> Self {
        Self { beatmap_id, game_mode: game_mode.as_u8(), mods, accuracy: None }
    }
}

fn cache_key(api_identifier: &str) -> String {
    format!("fokabot:np:{api_identifier}")
}

pub struct NpCache {
    client: redis::Client,
}

impl NpCache {
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn set(&self, api_identifier: &str, info: &NpInfo) -> Result<(), AppError> {
        let payload = serde_json::to_string(info).map_err(|e| AppError::Internal(e.to_string()))?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        redis::cmd("SET")
            .arg(cache_key(api_identifier))
            .arg(payload)
            .arg("EX")
            .arg(NP_CACHE_TTL_SECS)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::Transport(e.to_string()))
    }

    pub async fn get(&self, api_identifier: &str) -> Result<Option<NpInfo>, AppError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        let payload: Option<String> = redis::cmd("GET")
            .arg(cache_key(api_identifier))
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        match payload {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| AppError::Internal(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_matches_documented_format() {
        assert_eq!(cache_key("1"), "fokabot:np:1");
    }

    #[test]
    fn np_info_round_trips_through_json() {
        let info = NpInfo::new(129891, GameMode::Taiko, crate::commands::well_known::MOD_HIDDEN);
        let json = serde_json::to_string(&info).unwrap();
        let back: NpInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
