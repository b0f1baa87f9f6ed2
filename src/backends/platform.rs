//! Platform API client (spec §6): user id lookup, user edit, scores,
//! privilege ping.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn user_id_to_username(&self, user_id: i64) -> Result<String, AppError>;
    async fn silence(&self, user_id: i64, seconds: u64, reason: &str) -> Result<(), AppError>;
    async fn recent_scores(&self, username: &str, limit: u32) -> Result<Vec<Score>, AppError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Score {
    pub beatmap_id: i64,
    pub mode: u8,
    pub mods: u32,
    pub pp: f64,
    pub accuracy: f64,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

pub struct HttpPlatformApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpPlatformApi {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder cannot fail with these options");
        Self { client, base_url, token }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, AppError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body: Option<ApiError> = resp.json().await.ok();
            return Err(match body.and_then(|b| b.message) {
                Some(message) => AppError::BackendResponse(message),
                None => AppError::BackendResponse(format!("API Error: {status}")),
            });
        }

        resp.json::<T>().await.map_err(|e| AppError::BackendFatal(e.to_string()))
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformApi {
    async fn user_id_to_username(&self, user_id: i64) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Resp {
            username: String,
        }
        let resp: Resp = self.get_json("/users/lookup", &[("id", user_id.to_string())]).await?;
        Ok(resp.username)
    }

    async fn silence(&self, user_id: i64, seconds: u64, reason: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(format!("{}/users/silence", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "user_id": user_id, "seconds": seconds, "reason": reason }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        Ok(())
    }

    async fn recent_scores(&self, username: &str, limit: u32) -> Result<Vec<Score>, AppError> {
        self.get_json("/users/scores/recent", &[("username", username.to_string()), ("limit", limit.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_timeout() {
        let api = HttpPlatformApi::new("https://example.test".into(), "tok".into(), Duration::from_secs(5));
        assert_eq!(api.base_url, "https://example.test");
    }
}
