//! Presence/match API client (spec §6): channel list, match CRUD, invite,
//! team assignment, kick. Only the surface the Session FSM and Tournament
//! Engine actually call is modeled here.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[async_trait]
pub trait PresenceApi: Send + Sync {
    async fn list_channels(&self) -> Result<Vec<String>, AppError>;
    async fn is_online(&self, api_identifier: &str, game_only: bool) -> Result<bool, AppError>;
    async fn create_match(
        &self,
        name: &str,
        password: &str,
        slots: u32,
        game_mode: u8,
    ) -> Result<i64, AppError>;
    async fn match_kick(&self, match_id: i64, api_identifier: &str) -> Result<(), AppError>;
    async fn invite(&self, match_id: i64, api_identifier: &str) -> Result<(), AppError>;
    async fn alert(&self, api_identifier: &str, message: &str) -> Result<(), AppError>;
    async fn set_team(&self, match_id: i64, api_identifier: &str, team: u8) -> Result<(), AppError>;
    async fn move_to_free_slot(&self, match_id: i64, api_identifier: &str) -> Result<(), AppError>;
}

pub struct HttpPresenceApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpPresenceApi {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder cannot fail with these options");
        Self { client, base_url, token }
    }
}

#[async_trait]
impl PresenceApi for HttpPresenceApi {
    async fn list_channels(&self) -> Result<Vec<String>, AppError> {
        #[derive(Deserialize)]
        struct Channel {
            name: String,
        }
        let resp = self
            .client
            .get(format!("{}/channels", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        let channels: Vec<Channel> = resp.json().await.map_err(|e| AppError::BackendFatal(e.to_string()))?;
        Ok(channels.into_iter().map(|c| c.name).collect())
    }

    async fn is_online(&self, api_identifier: &str, game_only: bool) -> Result<bool, AppError> {
        #[derive(Deserialize)]
        struct Resp {
            online: bool,
        }
        let resp = self
            .client
            .get(format!("{}/clients/{api_identifier}", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("game_only", game_only.to_string())])
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        let resp: Resp = resp.json().await.map_err(|e| AppError::BackendFatal(e.to_string()))?;
        Ok(resp.online)
    }

    async fn create_match(&self, name: &str, password: &str, slots: u32, game_mode: u8) -> Result<i64, AppError> {
        #[derive(Deserialize)]
        struct Resp {
            match_id: i64,
        }
        let resp = self
            .client
            .post(format!("{}/matches", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "name": name, "password": password, "slots": slots, "game_mode": game_mode }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        let resp: Resp = resp.json().await.map_err(|e| AppError::BackendFatal(e.to_string()))?;
        Ok(resp.match_id)
    }

    async fn match_kick(&self, match_id: i64, api_identifier: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(format!("{}/matches/{match_id}/kick", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "api_identifier": api_identifier }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        Ok(())
    }

    async fn invite(&self, match_id: i64, api_identifier: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(format!("{}/matches/{match_id}/invite", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "api_identifier": api_identifier }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        Ok(())
    }

    async fn alert(&self, api_identifier: &str, message: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(format!("{}/clients/{api_identifier}/alert", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        Ok(())
    }

    async fn set_team(&self, match_id: i64, api_identifier: &str, team: u8) -> Result<(), AppError> {
        let resp = self
            .client
            .post(format!("{}/matches/{match_id}/set_team", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "api_identifier": api_identifier, "team": team }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        Ok(())
    }

    async fn move_to_free_slot(&self, match_id: i64, api_identifier: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .post(format!("{}/matches/{match_id}/move_to_free_slot", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "api_identifier": api_identifier }))
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        Ok(())
    }
}
