//! Beatmap mirror/metadata client (spec §6): map lookup used by leaf
//! commands like `!map`/`!roll`'s pool resolution. Falls back across
//! mirrors the way the original bot tries cheesegull then beatconnect.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct BeatmapInfo {
    pub beatmap_id: i64,
    pub beatmapset_id: i64,
    pub artist: String,
    pub title: String,
    pub version: String,
    pub star_rating: f64,
}

#[async_trait]
pub trait MapMirror: Send + Sync {
    async fn beatmap_by_id(&self, beatmap_id: i64) -> Result<BeatmapInfo, AppError>;
}

pub struct HttpMapMirror {
    client: reqwest::Client,
    primary_base_url: String,
    fallback_base_url: String,
}

impl HttpMapMirror {
    pub fn new(primary_base_url: String, fallback_base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder cannot fail with these options");
        Self { client, primary_base_url, fallback_base_url }
    }

    async fn fetch_from(&self, base_url: &str, beatmap_id: i64) -> Result<BeatmapInfo, AppError> {
        let resp = self
            .client
            .get(format!("{base_url}/b/{beatmap_id}"))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        resp.json().await.map_err(|e| AppError::BackendFatal(e.to_string()))
    }
}

#[async_trait]
impl MapMirror for HttpMapMirror {
    async fn beatmap_by_id(&self, beatmap_id: i64) -> Result<BeatmapInfo, AppError> {
        match self.fetch_from(&self.primary_base_url, beatmap_id).await {
            Ok(info) => Ok(info),
            Err(_) => self.fetch_from(&self.fallback_base_url, beatmap_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_both_mirrors() {
        let mirror = HttpMapMirror::new(
            "https://cheesegull.example.test".into(),
            "https://beatconnect.example.test".into(),
            Duration::from_secs(5),
        );
        assert_eq!(mirror.primary_base_url, "https://cheesegull.example.test");
        assert_eq!(mirror.fallback_base_url, "https://beatconnect.example.test");
    }
}
