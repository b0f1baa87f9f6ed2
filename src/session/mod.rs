//! Session FSM (spec §4.2): connect → authenticate → subscribe → join-all →
//! ready → suspend/resume → reconnect.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::eventbus::EventBus;
use crate::model::Session;
use crate::transport::{Frame, TransportEvent, TransportHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Subscribing,
    Joining,
    Ready,
    Suspended,
    Reconnecting,
}

/// Minimal contract for the presence API collaborator named in spec §6: the
/// full channel list fetched after `subscribed` to drive join-all.
#[async_trait]
pub trait ChannelLister: Send + Sync {
    async fn list_channels(&self) -> Result<Vec<String>, crate::error::AppError>;
}

pub struct SessionFsm<L: ChannelLister> {
    pub state: SessionState,
    pub session: Session,
    transport: TransportHandle,
    bus: EventBus,
    channel_lister: L,
    bot_token: String,
}

impl<L: ChannelLister> SessionFsm<L> {
    pub fn new(transport: TransportHandle, bus: EventBus, channel_lister: L, bot_token: String) -> Self {
        Self {
            state: SessionState::Disconnected,
            session: Session::new(),
            transport,
            bus,
            channel_lister,
            bot_token,
        }
    }

    /// Drives the FSM from the transport's inbound event stream until the
    /// channel closes (transport shut down).
    pub async fn run(mut self, mut inbound: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = inbound.recv().await {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => self.on_connected(),
            TransportEvent::Disconnected => self.on_disconnected(),
            TransportEvent::Frame(frame) => self.on_frame(frame).await,
        }
    }

    fn on_connected(&mut self) {
        self.state = SessionState::Authenticating;
        if let Some(token) = self.session.resume_token.clone() {
            let _ = self.transport.send(Frame::resume(&token));
        } else {
            let _ = self.transport.send(Frame::auth(&self.bot_token));
        }
    }

    fn on_disconnected(&mut self) {
        if self.state == SessionState::Reconnecting {
            return;
        }
        self.state = SessionState::Reconnecting;
        self.bus.trigger("disconnected", serde_json::json!({}));
        if !self.session.suspended {
            self.session.reset();
        }
    }

    async fn on_frame(&mut self, frame: Frame) {
        match frame.kind.as_str() {
            "auth_success" => self.on_auth_success(),
            "auth_failure" => self.on_auth_failure(),
            "subscribed" => self.on_subscribed().await,
            "chat_channel_joined" => self.on_channel_joined(&frame),
            "chat_channel_added" => { /* informational; no session mutation */ }
            "chat_channel_removed" | "chat_channel_left" => self.on_channel_left(&frame),
            "ping" => {
                let _ = self.transport.send(Frame::pong());
            }
            "suspend" => self.on_suspend(&frame),
            "resume_success" => self.on_resume_success(),
            "resume_failure" => self.on_resume_failure(),
            "chat_message" => self.bus.trigger("chat_message", frame.data),
            "status_update" => self.bus.trigger("status_update", frame.data),
            "lobby_match_added" => self.bus.trigger("lobby_match_added", frame.data),
            "lobby_match_removed" => self.bus.trigger("lobby_match_removed", frame.data),
            "match_update" => self.bus.trigger("match_update", frame.data),
            "match_user_joined" => self.bus.trigger("match_user_joined", frame.data),
            other => warn!(kind = other, "unhandled inbound frame kind"),
        }
    }

    fn on_auth_success(&mut self) {
        self.state = SessionState::Subscribing;
        let _ = self.transport.send(Frame::subscribe("chat_channels"));
    }

    fn on_auth_failure(&mut self) {
        warn!("authentication failed");
        self.state = SessionState::Reconnecting;
    }

    async fn on_subscribed(&mut self) {
        self.state = SessionState::Joining;
        match self.channel_lister.list_channels().await {
            Ok(channels) => {
                self.session.login_channels_left = channels.iter().cloned().collect();
                for name in &channels {
                    let _ = self.transport.send(Frame::join_chat_channel(name));
                }
                if channels.is_empty() {
                    self.become_ready();
                }
            }
            Err(e) => warn!(error = %e, "failed to list channels after subscribe"),
        }
    }

    fn on_channel_joined(&mut self, frame: &Frame) {
        if let Some(name) = frame.data.get("name").and_then(|v| v.as_str()) {
            self.session.join_channel(name);
            self.session.login_channels_left.remove(name);
            if self.state == SessionState::Joining && self.session.login_channels_left.is_empty() {
                self.become_ready();
            }
        }
    }

    fn on_channel_left(&mut self, frame: &Frame) {
        if let Some(name) = frame.data.get("name").and_then(|v| v.as_str()) {
            self.session.leave_channel(name);
        }
    }

    fn become_ready(&mut self) {
        self.state = SessionState::Ready;
        self.session.ready = true;
        info!("session ready");
        self.bus.trigger("ready", serde_json::json!({}));
    }

    fn on_suspend(&mut self, frame: &Frame) {
        if let Some(token) = frame.data.get("token").and_then(|v| v.as_str()) {
            self.session.suspended = true;
            self.session.resume_token = Some(token.to_string());
        }
        self.state = SessionState::Suspended;
    }

    fn on_resume_success(&mut self) {
        self.session.resume_token = None;
        self.session.suspended = false;
        self.state = SessionState::Ready;
        self.bus.trigger("resumed", serde_json::json!({}));
    }

    fn on_resume_failure(&mut self) {
        warn!("resume failed");
        self.session.resume_token = None;
        self.session.suspended = false;
        self.session.reset();
        self.state = SessionState::Reconnecting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct FixedLister(Vec<String>);

    #[async_trait]
    impl ChannelLister for FixedLister {
        async fn list_channels(&self) -> Result<Vec<String>, AppError> {
            Ok(self.0.clone())
        }
    }

    fn fsm_with_channels(channels: Vec<String>) -> (SessionFsm<FixedLister>, TransportHandle) {
        let (transport, _inbound) = crate::transport::spawn(
            "wss://unused.invalid/".into(),
            tokio_util::sync::CancellationToken::new(),
        );
        let bus = EventBus::new();
        let fsm = SessionFsm::new(transport.clone(), bus, FixedLister(channels), "tok".into());
        (fsm, transport)
    }

    #[tokio::test]
    async fn join_all_reaches_ready_when_channels_empty() {
        let (mut fsm, _t) = fsm_with_channels(vec![]);
        fsm.on_connected();
        fsm.on_auth_success();
        fsm.on_subscribed().await;
        assert_eq!(fsm.state, SessionState::Ready);
        assert!(fsm.session.ready);
        assert!(fsm.session.login_channels_left.is_empty());
    }

    #[tokio::test]
    async fn join_all_waits_for_every_channel() {
        let (mut fsm, _t) = fsm_with_channels(vec!["#osu".into(), "#announce".into()]);
        fsm.on_subscribed().await;
        assert_eq!(fsm.state, SessionState::Joining);
        fsm.on_channel_joined(&Frame::new("chat_channel_joined", serde_json::json!({"name": "#osu"})));
        assert!(!fsm.session.ready);
        fsm.on_channel_joined(&Frame::new("chat_channel_joined", serde_json::json!({"name": "#announce"})));
        assert!(fsm.session.ready);
        assert_eq!(fsm.state, SessionState::Ready);
    }

    #[tokio::test]
    async fn suspend_then_resume_clears_token_without_resetting_channels() {
        let (mut fsm, _t) = fsm_with_channels(vec![]);
        fsm.on_subscribed().await;
        fsm.session.join_channel("#osu");
        fsm.on_suspend(&Frame::new("suspend", serde_json::json!({"token": "T"})));
        assert!(fsm.session.suspended);
        assert_eq!(fsm.session.resume_token.as_deref(), Some("T"));
        fsm.on_resume_success();
        assert!(!fsm.session.suspended);
        assert!(fsm.session.resume_token.is_none());
        assert!(fsm.session.joined_channels.contains("#osu"));
    }

    #[tokio::test]
    async fn unexpected_disconnect_resets_unless_suspended() {
        let (mut fsm, _t) = fsm_with_channels(vec![]);
        fsm.on_subscribed().await;
        fsm.session.join_channel("#osu");
        fsm.on_disconnected();
        assert!(fsm.session.joined_channels.is_empty());
    }

    #[tokio::test]
    async fn suspended_disconnect_does_not_reset_session() {
        let (mut fsm, _t) = fsm_with_channels(vec![]);
        fsm.on_subscribed().await;
        fsm.session.join_channel("#osu");
        fsm.on_suspend(&Frame::new("suspend", serde_json::json!({"token": "T"})));
        fsm.on_disconnected();
        assert!(fsm.session.joined_channels.contains("#osu"));
    }
}
