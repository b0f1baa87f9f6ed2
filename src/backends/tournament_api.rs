//! Tournament backend client (spec §6): pending-matches listing used by
//! the Tournament Engine to recover in-progress rounds after a restart.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct PendingMatch {
    pub match_id: i64,
    pub room_name: String,
    pub team_size: u32,
}

#[async_trait]
pub trait TournamentApi: Send + Sync {
    async fn pending_matches(&self) -> Result<Vec<PendingMatch>, AppError>;
}

pub struct HttpTournamentApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTournamentApi {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder cannot fail with these options");
        Self { client, base_url, token }
    }
}

#[async_trait]
impl TournamentApi for HttpTournamentApi {
    async fn pending_matches(&self) -> Result<Vec<PendingMatch>, AppError> {
        let resp = self
            .client
            .get(format!("{}/tournament/matches/pending", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::BackendFatal(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::BackendResponse(format!("API Error: {}", resp.status())));
        }
        resp.json().await.map_err(|e| AppError::BackendFatal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_token() {
        let api = HttpTournamentApi::new("https://misirlou.example.test".into(), "tok".into(), Duration::from_secs(5));
        assert_eq!(api.base_url, "https://misirlou.example.test");
    }
}
