//! PP-at-accuracy service client (spec §6): used by leaf commands that
//! compute "what would this score be worth at 98% acc" style answers.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[async_trait]
pub trait ScoreApi: Send + Sync {
    async fn pp_at_accuracy(&self, beatmap_id: i64, mode: u8, mods: u32, accuracy: f64) -> Result<f64, AppError>;
}

pub struct HttpScoreApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScoreApi {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder cannot fail with these options");
        Self { client, base_url }
    }
}

#[async_trait]
impl ScoreApi for HttpScoreApi {
    async fn pp_at_accuracy(&self, beatmap_id: i64, mode: u8, mods: u32, accuracy: f64) -> Result<f64, AppError> {
        #[derive(Deserialize)]
        struct Resp {
            pp: f64,
        }
        let resp = self
            .client
            .get(format!("{}/pp", self.base_url))
            .query(&[
                ("beatmap_id", beatmap_id.to_string()),
                ("mode", mode.to_string()),
                ("mods", mods.to_string()),
                ("accuracy", accuracy.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        let resp: Resp = resp.json().await.map_err(|e| AppError::BackendFatal(e.to_string()))?;
        Ok(resp.pp)
    }
}
