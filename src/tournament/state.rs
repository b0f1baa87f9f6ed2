//! Per-match state machine (spec §4.10).
//!
//! `WAITING -> ROLLING -> BANNING -> PICKING -> CONFIRMING -> PLAYING ->
//! (back to BANNING or PICKING) -> END`, plus a `MISSING_PLAYERS`
//! side-state entered while a team has fewer than `team_size` present
//! members. Grounded on `original_source/plugins/tournament.py`'s
//! `match_user_joined` slot classification and roll/ban/pick flow,
//! simplified to a fixed number of bans per match instead of an
//! open-ended ban list.

use std::collections::HashSet;

use thiserror::Error;

use super::pool::Pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn other(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Waiting,
    MissingPlayers,
    Rolling,
    Banning,
    Picking,
    Confirming,
    Playing,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Ban,
    Pick,
}

/// `roster` preserves join order (spec §3: "member user-ids (ordered)");
/// `captain` is only ever set through [`TeamState::set_captain`], which
/// enforces the `captain ∈ members` invariant.
#[derive(Debug, Default)]
pub struct TeamState {
    pub roster: Vec<i64>,
    pub members_in_match: HashSet<i64>,
    captain: Option<i64>,
    pub roll: Option<u32>,
}

impl TeamState {
    pub fn is_full(&self, team_size: u32) -> bool {
        self.members_in_match.len() as u32 >= team_size
    }

    pub fn captain(&self) -> Option<i64> {
        self.captain
    }

    /// Elects `user_id` as this team's captain. Rejected if `user_id` isn't
    /// on the roster, keeping `captain ∈ members` true at all times.
    pub fn set_captain(&mut self, user_id: i64) -> Result<(), TournamentError> {
        if !self.roster.contains(&user_id) {
            return Err(TournamentError::NotInRoster);
        }
        self.captain = Some(user_id);
        Ok(())
    }

    pub fn can_act(&self, user_id: i64) -> bool {
        match self.captain {
            Some(captain) => captain == user_id,
            None => self.members_in_match.contains(&user_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    Player { team: Team, already_joined: bool },
    Staff,
    Kick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    Recorded,
    Tie,
    Winner(Team),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    BanCommitted { next_picker: Team, advanced_to_picking: bool },
    PickCommitted,
    Rejected,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TournamentError {
    #[error("wrong match state for this action")]
    WrongState,
    #[error("not your team's turn")]
    NotYourTurn,
    #[error("only the captain may do that")]
    NotCaptain,
    #[error("no candidate awaiting confirmation")]
    NoCandidate,
    #[error("that map has already been banned")]
    AlreadyBanned,
    #[error("unrecognized pool code")]
    UnknownCode,

    #[error("captain must be a roster member")]
    NotInRoster,
}

pub struct TournamentMatch {
    pub match_id: i64,
    pub team_size: u32,
    pub team_a: TeamState,
    pub team_b: TeamState,
    pub pool: Pool,
    pub state: MatchState,
    pub banned: HashSet<String>,
    pub picked: Vec<String>,
    pub picker: Option<Team>,
    pub bans_required: u32,
    pub password: String,
    pub tiebreaker: Option<String>,
    bans_done: u32,
    candidate: Option<(Team, String, Operation)>,
}

impl TournamentMatch {
    /// `password` is the room password already handed to the presence API
    /// when the room was created. The tie-breaker map is resolved from the
    /// pool's `TB1` slot, per the GLOSSARY's "Pool" entry (`... FM, TB`).
    pub fn new(match_id: i64, team_size: u32, pool: Pool, bans_required: u32, password: String) -> Self {
        let tiebreaker = pool.resolve("TB1").map(|(group, entry)| format!("{group}{}", entry.beatmap_id));
        Self {
            match_id,
            team_size,
            team_a: TeamState::default(),
            team_b: TeamState::default(),
            pool,
            state: MatchState::MissingPlayers,
            banned: HashSet::new(),
            picked: Vec::new(),
            picker: None,
            bans_required,
            password,
            tiebreaker,
            bans_done: 0,
            candidate: None,
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut TeamState {
        match team {
            Team::A => &mut self.team_a,
            Team::B => &mut self.team_b,
        }
    }

    pub fn team(&self, team: Team) -> &TeamState {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    /// Classifies a `match_user_joined` event against this match's roster.
    pub fn classify_join(&mut self, user_id: i64, is_tournament_staff: bool) -> JoinDecision {
        for team in [Team::A, Team::B] {
            if self.team(team).roster.contains(&user_id) {
                let already_joined = self.team(team).members_in_match.contains(&user_id);
                self.team_mut(team).members_in_match.insert(user_id);
                return JoinDecision::Player { team, already_joined };
            }
        }
        if is_tournament_staff {
            return JoinDecision::Staff;
        }
        JoinDecision::Kick
    }

    /// Call after a player join; transitions `MissingPlayers -> Rolling`
    /// once both teams have reached `team_size` present members.
    pub fn maybe_start_rolling(&mut self) -> bool {
        if self.state == MatchState::MissingPlayers
            && self.team_a.is_full(self.team_size)
            && self.team_b.is_full(self.team_size)
        {
            self.state = MatchState::Rolling;
            return true;
        }
        false
    }

    /// Records one team's `!roll` value. Ties clear both rolls and ask for
    /// a re-roll; the higher roll becomes the picker and moves the match
    /// into `Banning`.
    pub fn record_roll(&mut self, team: Team, value: u32) -> Result<RollOutcome, TournamentError> {
        if self.state != MatchState::Rolling {
            return Err(TournamentError::WrongState);
        }
        self.team_mut(team).roll = Some(value);
        let (a, b) = (self.team_a.roll, self.team_b.roll);
        match (a, b) {
            (Some(ra), Some(rb)) if ra == rb => {
                self.team_a.roll = None;
                self.team_b.roll = None;
                Ok(RollOutcome::Tie)
            }
            (Some(ra), Some(rb)) => {
                let winner = if ra > rb { Team::A } else { Team::B };
                self.picker = Some(winner);
                self.state = MatchState::Banning;
                Ok(RollOutcome::Winner(winner))
            }
            _ => Ok(RollOutcome::Recorded),
        }
    }

    /// A team member proposes banning or picking `code` (e.g. `"HD2"`).
    /// Requires confirmation before it takes effect via `confirm_candidate`.
    pub fn propose(&mut self, team: Team, user_id: i64, code: &str) -> Result<(), TournamentError> {
        let expected_state = match self.state {
            MatchState::Banning => Operation::Ban,
            MatchState::Picking => Operation::Pick,
            _ => return Err(TournamentError::WrongState),
        };
        if self.picker != Some(team) {
            return Err(TournamentError::NotYourTurn);
        }
        if !self.team(team).can_act(user_id) {
            return Err(TournamentError::NotCaptain);
        }
        let (group, entry) = self.pool.resolve(code).ok_or(TournamentError::UnknownCode)?;
        let key = format!("{group}{}", entry.beatmap_id);
        if expected_state == Operation::Ban && self.banned.contains(&key) {
            self.candidate = None;
            return Err(TournamentError::AlreadyBanned);
        }
        self.candidate = Some((team, key, expected_state));
        self.state = MatchState::Confirming;
        Ok(())
    }

    /// Resolves the pending ban/pick. `confirm = false` clears the
    /// candidate and returns the match to its prior state for re-prompting.
    pub fn confirm_candidate(&mut self, confirm: bool) -> Result<ConfirmOutcome, TournamentError> {
        let (team, key, op) = self.candidate.take().ok_or(TournamentError::NoCandidate)?;
        if !confirm {
            self.state = match op {
                Operation::Ban => MatchState::Banning,
                Operation::Pick => MatchState::Picking,
            };
            return Ok(ConfirmOutcome::Rejected);
        }
        match op {
            Operation::Ban => {
                self.banned.insert(key);
                self.bans_done += 1;
                if self.bans_done >= self.bans_required {
                    self.state = MatchState::Picking;
                    self.picker = Some(team);
                    Ok(ConfirmOutcome::BanCommitted { next_picker: team, advanced_to_picking: true })
                } else {
                    let next = team.other();
                    self.picker = Some(next);
                    self.state = MatchState::Banning;
                    Ok(ConfirmOutcome::BanCommitted { next_picker: next, advanced_to_picking: false })
                }
            }
            Operation::Pick => {
                self.picked.push(key);
                self.state = MatchState::Playing;
                self.picker = None;
                Ok(ConfirmOutcome::PickCommitted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::pool::PoolEntry;
    use super::*;

    fn pool_with_one_hd_and_one_nm() -> Pool {
        let mut pool = Pool::new();
        pool.insert("NM", PoolEntry { beatmap_id: 100, name: "nm1".into() });
        pool.insert("HD", PoolEntry { beatmap_id: 200, name: "hd1".into() });
        pool
    }

    fn ready_match() -> TournamentMatch {
        let mut m = TournamentMatch::new(1, 1, pool_with_one_hd_and_one_nm(), 1, "test-password".into());
        m.team_a.roster.push(10);
        m.team_b.roster.push(20);
        assert_eq!(m.classify_join(10, false), JoinDecision::Player { team: Team::A, already_joined: false });
        assert!(!m.maybe_start_rolling());
        assert_eq!(m.classify_join(20, false), JoinDecision::Player { team: Team::B, already_joined: false });
        assert!(m.maybe_start_rolling());
        assert_eq!(m.state, MatchState::Rolling);
        m
    }

    #[test]
    fn unassigned_non_staff_is_kicked() {
        let mut m = TournamentMatch::new(1, 1, Pool::new(), 1, "test-password".into());
        m.team_a.roster.push(10);
        assert_eq!(m.classify_join(999, false), JoinDecision::Kick);
    }

    #[test]
    fn unassigned_staff_is_moved_not_kicked() {
        let mut m = TournamentMatch::new(1, 1, Pool::new(), 1, "test-password".into());
        assert_eq!(m.classify_join(555, true), JoinDecision::Staff);
    }

    #[test]
    fn both_teams_full_starts_rolling() {
        ready_match();
    }

    #[test]
    fn tied_roll_clears_both_and_does_not_advance() {
        let mut m = ready_match();
        assert_eq!(m.record_roll(Team::A, 50).unwrap(), RollOutcome::Recorded);
        assert_eq!(m.record_roll(Team::B, 50).unwrap(), RollOutcome::Tie);
        assert_eq!(m.state, MatchState::Rolling);
        assert!(m.team_a.roll.is_none());
        assert!(m.team_b.roll.is_none());
    }

    #[test]
    fn higher_roll_becomes_picker_and_enters_banning() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        let outcome = m.record_roll(Team::B, 20).unwrap();
        assert_eq!(outcome, RollOutcome::Winner(Team::A));
        assert_eq!(m.state, MatchState::Banning);
        assert_eq!(m.picker, Some(Team::A));
    }

    #[test]
    fn ban_requires_confirmation_and_rejection_reprompts_same_phase() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        m.propose(Team::A, 10, "HD1").unwrap();
        assert_eq!(m.state, MatchState::Confirming);
        let outcome = m.confirm_candidate(false).unwrap();
        assert_eq!(outcome, ConfirmOutcome::Rejected);
        assert_eq!(m.state, MatchState::Banning);
        assert!(m.banned.is_empty());
    }

    #[test]
    fn re_banning_already_banned_map_errors_and_clears_candidate() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        m.propose(Team::A, 10, "HD1").unwrap();
        m.confirm_candidate(true).unwrap();
        // bans_required == 1, so we're already in Picking now; force back to
        // Banning to exercise the already-banned path directly.
        m.state = MatchState::Banning;
        m.picker = Some(Team::B);
        assert_eq!(m.propose(Team::B, 20, "HD1"), Err(TournamentError::AlreadyBanned));
    }

    #[test]
    fn single_ban_quota_advances_straight_to_picking() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        m.propose(Team::A, 10, "HD1").unwrap();
        let outcome = m.confirm_candidate(true).unwrap();
        assert_eq!(outcome, ConfirmOutcome::BanCommitted { next_picker: Team::A, advanced_to_picking: true });
        assert_eq!(m.state, MatchState::Picking);
    }

    #[test]
    fn pick_confirmation_moves_to_playing() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        m.propose(Team::A, 10, "HD1").unwrap();
        m.confirm_candidate(true).unwrap();
        m.propose(Team::A, 10, "NM1").unwrap();
        let outcome = m.confirm_candidate(true).unwrap();
        assert_eq!(outcome, ConfirmOutcome::PickCommitted);
        assert_eq!(m.state, MatchState::Playing);
        assert_eq!(m.picked, vec!["NM100".to_string()]);
    }

    #[test]
    fn only_captain_may_act_when_captain_present() {
        let mut m = ready_match();
        m.team_a.set_captain(10).unwrap();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        assert_eq!(m.propose(Team::A, 999, "HD1"), Err(TournamentError::NotCaptain));
    }

    #[test]
    fn set_captain_rejects_non_roster_member() {
        let mut m = ready_match();
        assert_eq!(m.team_a.set_captain(999), Err(TournamentError::NotInRoster));
        assert_eq!(m.team_a.captain(), None);
    }

    #[test]
    fn any_member_may_act_when_no_captain() {
        let mut m = ready_match();
        m.team_a.members_in_match.insert(11);
        m.team_a.roster.push(11);
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        assert!(m.propose(Team::A, 11, "HD1").is_ok());
    }

    #[test]
    fn wrong_team_turn_is_rejected() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        assert_eq!(m.propose(Team::B, 20, "HD1"), Err(TournamentError::NotYourTurn));
    }

    #[test]
    fn unknown_code_errors() {
        let mut m = ready_match();
        m.record_roll(Team::A, 80).unwrap();
        m.record_roll(Team::B, 20).unwrap();
        assert_eq!(m.propose(Team::A, 10, "ZZ9"), Err(TournamentError::UnknownCode));
    }
}
