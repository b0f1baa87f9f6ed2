//! Tournament Engine (spec §4.10): match creation, join classification,
//! and the roll/ban/pick flow. State transitions live in [`state`]; pool
//! resolution in [`pool`]. This module owns the collection of live
//! matches and the side effects (invites, alerts, kicks) the reference
//! bot drives through `bancho_api_client` in
//! `original_source/plugins/tournament.py`.

pub mod pool;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::warn;

use crate::backends::PresenceApi;
use crate::error::AppError;
use pool::Pool;
use state::{ConfirmOutcome, JoinDecision, RollOutcome, Team, TournamentError, TournamentMatch};

pub struct RosterMember {
    pub user_id: i64,
    pub api_identifier: String,
}

pub struct TournamentEngine {
    matches: Mutex<HashMap<i64, TournamentMatch>>,
    presence: Arc<dyn PresenceApi>,
}

impl TournamentEngine {
    pub fn new(presence: Arc<dyn PresenceApi>) -> Self {
        Self { matches: Mutex::new(HashMap::new()), presence }
    }

    fn generate_password() -> String {
        rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect()
    }

    /// Creates a room for one tournament match and invites every roster
    /// member currently online. `game_mode` and `team_size` are pinned by
    /// the calling command; rules (team-VS, score-v2, frozen) are the
    /// backend's defaults for tournament rooms.
    pub async fn create_match(
        &self,
        room_name: &str,
        team_size: u32,
        game_mode: u8,
        pool: Pool,
        bans_required: u32,
        roster_a: Vec<RosterMember>,
        roster_b: Vec<RosterMember>,
    ) -> Result<i64, AppError> {
        let password = Self::generate_password();
        let slots = team_size * 2 + 1;
        let match_id = self.presence.create_match(room_name, &password, slots, game_mode).await?;

        let mut tm = TournamentMatch::new(match_id, team_size, pool, bans_required, password);
        for member in &roster_a {
            tm.team_a.roster.push(member.user_id);
        }
        for member in &roster_b {
            tm.team_b.roster.push(member.user_id);
        }

        for member in roster_a.iter().chain(roster_b.iter()) {
            match self.presence.is_online(&member.api_identifier, true).await {
                Ok(true) => {
                    if let Err(e) = self.presence.invite(match_id, &member.api_identifier).await {
                        warn!(user_id = member.user_id, error = %e, "tournament: invite failed");
                    }
                }
                Ok(false) => {}
                Err(e) => warn!(user_id = member.user_id, error = %e, "tournament: presence check failed"),
            }
        }

        self.matches.lock().await.insert(match_id, tm);
        Ok(match_id)
    }

    /// Handles `match_user_joined`: assigns the player to their team,
    /// moves tournament staff out of the way, kicks anyone else.
    pub async fn handle_user_joined(
        &self,
        match_id: i64,
        user_id: i64,
        api_identifier: &str,
        is_tournament_staff: bool,
    ) -> Option<JoinOutcome> {
        let mut matches = self.matches.lock().await;
        let tm = matches.get_mut(&match_id)?;
        let decision = tm.classify_join(user_id, is_tournament_staff);
        let teams_now_full = matches!(decision, JoinDecision::Player { .. }) && tm.maybe_start_rolling();

        match decision {
            JoinDecision::Kick => {
                if let Err(e) = self.presence.match_kick(match_id, api_identifier).await {
                    warn!(%match_id, error = %e, "tournament: kick failed");
                }
                let _ = self
                    .presence
                    .alert(api_identifier, "This is a tournament match and you are not allowed to be in there.")
                    .await;
                Some(JoinOutcome::Kicked)
            }
            JoinDecision::Staff => {
                if let Err(e) = self.presence.move_to_free_slot(match_id, api_identifier).await {
                    warn!(%match_id, error = %e, "tournament: move to free slot failed");
                }
                Some(JoinOutcome::MovedAsStaff)
            }
            JoinDecision::Player { team, already_joined } => {
                if let Err(e) = self.presence.set_team(match_id, api_identifier, team.as_u8()).await {
                    warn!(%match_id, error = %e, "tournament: set team failed");
                }
                Some(JoinOutcome::Assigned { team, already_joined, teams_now_full })
            }
        }
    }

    pub async fn handle_roll(&self, match_id: i64, team: Team, value: u32) -> Option<Result<RollOutcome, TournamentError>> {
        let mut matches = self.matches.lock().await;
        let tm = matches.get_mut(&match_id)?;
        Some(tm.record_roll(team, value))
    }

    pub async fn handle_propose(&self, match_id: i64, team: Team, user_id: i64, code: &str) -> Option<Result<(), TournamentError>> {
        let mut matches = self.matches.lock().await;
        let tm = matches.get_mut(&match_id)?;
        Some(tm.propose(team, user_id, code))
    }

    pub async fn handle_confirm(&self, match_id: i64, confirm: bool) -> Option<Result<ConfirmOutcome, TournamentError>> {
        let mut matches = self.matches.lock().await;
        let tm = matches.get_mut(&match_id)?;
        Some(tm.confirm_candidate(confirm))
    }

    pub async fn is_tracked(&self, match_id: i64) -> bool {
        self.matches.lock().await.contains_key(&match_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Assigned { team: Team, already_joined: bool, teams_now_full: bool },
    MovedAsStaff,
    Kicked,
}
