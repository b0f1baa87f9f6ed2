//! Core data model shared across components (spec §3).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::privileges::Privileges;

/// The current attachment to the chat server. Created once per process,
/// mutated only by the Session FSM.
#[derive(Debug, Clone)]
pub struct Session {
    pub ready: bool,
    pub suspended: bool,
    pub resume_token: Option<String>,
    pub joined_channels: HashSet<String>,
    pub login_channels_left: HashSet<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            ready: false,
            suspended: false,
            resume_token: None,
            joined_channels: HashSet::new(),
            login_channels_left: HashSet::new(),
        }
    }

    /// Invariant: `ready` ⇒ `login_channels_left` is empty.
    pub fn invariant_ready_implies_no_pending_joins(&self) -> bool {
        !self.ready || self.login_channels_left.is_empty()
    }

    /// Invariant: `suspended` ⇔ `resume_token` is non-null.
    pub fn invariant_suspended_matches_token(&self) -> bool {
        self.suspended == self.resume_token.is_some()
    }

    /// Reset session state for a fresh (non-resume) connection attempt.
    pub fn reset(&mut self) {
        self.ready = false;
        self.joined_channels.clear();
        self.login_channels_left.clear();
    }

    pub fn join_channel(&mut self, name: &str) {
        self.joined_channels.insert(name.to_string());
    }

    pub fn leave_channel(&mut self, name: &str) {
        self.joined_channels.remove(name);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Osu,
    Irc,
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: i64,
    pub username: String,
    pub privileges: Privileges,
    pub api_identifier: String,
    #[serde(rename = "type")]
    pub kind: ClientKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub display_name: Option<String>,
    pub kind: ClientKind,
}

/// An inbound chat message, immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub sender: Sender,
    pub recipient: Recipient,
    pub pm: bool,
    pub message: String,
}

impl IncomingMessage {
    /// Where a reply to this message should be sent: the sender in a PM,
    /// the recipient channel otherwise.
    pub fn reply_target(&self) -> &str {
        if self.pm {
            &self.sender.username
        } else {
            &self.recipient.name
        }
    }
}
