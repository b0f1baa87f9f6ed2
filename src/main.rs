//! fokabot-core — supervisor entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger
//!   4. Build backend clients, FAQ store, transport, event bus
//!   5. Wire the Session FSM, Command Registry/Runtime, Tournament Engine
//!   6. Spawn every long-running piece under one supervisor
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Join the supervisor

mod backends;
mod commands;
mod config;
mod error;
mod eventbus;
mod httpapi;
mod logger;
mod model;
mod npcache;
mod privileges;
mod pubsub;
mod scheduler;
mod session;
mod supervisor;
mod tournament;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use backends::{FaqStore, PlatformApi, PresenceApi, ScoreApi, TournamentApi};
use backends::platform::HttpPlatformApi;
use backends::presence::HttpPresenceApi;
use backends::score::HttpScoreApi;
use backends::tournament_api::HttpTournamentApi;
use commands::spec::{ArgSpec, CommandKind, CommandSpec};
use commands::CommandRegistry;
use error::AppError;
use eventbus::EventBus;
use model::IncomingMessage;
use npcache::NpCache;
use privileges::Privileges;
use session::{ChannelLister, SessionFsm};
use supervisor::{Component, ComponentFuture, SupervisorHandle};
use transport::{Frame, TransportHandle};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level, false)?;

    info!(bot_name = %config.bot_name, "config loaded");

    let shutdown = CancellationToken::new();

    let platform: Arc<dyn PlatformApi> = Arc::new(HttpPlatformApi::new(
        config.backend.ripple_api_base.clone(),
        config.backend.ripple_api_token.clone(),
        config.backend.http_timeout,
    ));
    let presence: Arc<dyn PresenceApi> = Arc::new(HttpPresenceApi::new(
        config.backend.bancho_api_base.clone(),
        config.backend.bancho_api_token.clone(),
        config.backend.http_timeout,
    ));
    let tournament_api = Arc::new(HttpTournamentApi::new(
        config.backend.misirlou_api_base.clone(),
        config.backend.misirlou_api_token.clone(),
        config.backend.http_timeout,
    ));
    let score_api: Arc<dyn ScoreApi> =
        Arc::new(HttpScoreApi::new(config.backend.lets_api_base.clone(), config.backend.http_timeout));
    let np_cache = Arc::new(NpCache::new(&config.pubsub.redis_url)?);
    let faq_store = Arc::new(FaqStore::load(config.faq_store.path.clone())?);

    let (transport, inbound_rx) = transport::spawn(config.chat.wss_url.clone(), shutdown.clone());
    let bus = EventBus::new();

    let registry = Arc::new(build_registry(&config.chat.commands_prefix, faq_store.clone(), score_api, np_cache)?);
    let tournament_engine = Arc::new(tournament::TournamentEngine::new(presence.clone()));

    register_chat_message_handler(&bus, registry, transport.clone());
    register_match_user_joined_handler(&bus, tournament_engine.clone());

    let (pubsub_tx, pubsub_rx) = tokio::sync::mpsc::channel(256);
    let mut ingress = pubsub::Ingress::new();
    ingress.register("fokabot:message", pubsub::message_handler());

    let mut components: Vec<Box<dyn Component>> = Vec::new();

    components.push(Box::new(SessionComponent {
        fsm: SessionFsm::new(
            transport.clone(),
            bus.clone(),
            PresenceChannelLister(presence.clone()),
            config.chat.bot_token.clone(),
        ),
        inbound_rx,
    }));

    components.push(Box::new(PubSubComponent {
        redis_url: config.pubsub.redis_url.clone(),
        ingress,
        rx: pubsub_rx,
        tx: pubsub_tx,
        transport: transport.clone(),
    }));

    components.push(Box::new(HttpApiComponent {
        bind_addr: config.internal_api.bind_addr.clone(),
        state: httpapi::ApiState {
            secret: Arc::from(config.internal_api.secret.as_str()),
            transport: transport.clone(),
            platform: platform.clone(),
        },
    }));

    components.push(Box::new(TournamentPollComponent { tournament_api }));

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    let handle: SupervisorHandle = supervisor::spawn_components(components, shutdown);
    handle.join().await
}

/// Registers the built-in commands that ship with the core: `roll`,
/// `faq`, `help` (matching the reference plugin base's `general.py`), and
/// the `/np` now-playing action (matching `pp.py`).
fn build_registry(
    prefix: &str,
    faq_store: Arc<FaqStore>,
    score_api: Arc<dyn ScoreApi>,
    np_cache: Arc<NpCache>,
) -> Result<CommandRegistry, AppError> {
    let mut registry = CommandRegistry::new(prefix);

    let as_u32: commands::spec::Validator = Arc::new(|s: &str| s.parse::<u32>().ok().filter(|&n| n > 0).map(|n| Value::Number(n.into())));

    registry.register(CommandSpec {
        name: "roll".into(),
        aliases: vec![],
        kind: CommandKind::Command,
        args: vec![ArgSpec::optional("number", as_u32, serde_json::json!(100))],
        regex: None,
        predicate: None,
        required_privileges: Privileges::NONE,
        handler: Arc::new(|msg, args| {
            Box::pin(async move {
                let bound = args.get("number").and_then(|v| v.as_u64()).unwrap_or(100).max(1);
                let roll = rand::random::<u64>() % bound;
                Ok(vec![format!("{} rolls {} points!", msg.sender.username, roll)])
            })
        }),
    })?;

    registry.register(CommandSpec {
        name: "help".into(),
        aliases: vec![],
        kind: CommandKind::Command,
        args: vec![],
        regex: None,
        predicate: None,
        required_privileges: Privileges::NONE,
        handler: Arc::new(|_msg, _args| {
            Box::pin(async {
                Ok(vec!["Click here for FokaBot's full command list: https://ripple.moe/pages/help".to_string()])
            })
        }),
    })?;

    registry.register(CommandSpec {
        name: "faq".into(),
        aliases: vec![],
        kind: CommandKind::Command,
        args: vec![ArgSpec::required(
            "topic",
            Arc::new(|s: &str| Some(Value::String(s.to_string()))),
        )],
        regex: None,
        predicate: None,
        required_privileges: Privileges::NONE,
        handler: Arc::new(move |_msg, args| {
            let faq_store = faq_store.clone();
            Box::pin(async move {
                let topic = args.get("topic").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let reply = faq_store.get(&topic)?.unwrap_or_else(|| "No such FAQ topic.".to_string());
                Ok(vec![reply])
            })
        }),
    })?;

    registry.register(CommandSpec {
        name: "is playing".into(),
        aliases: vec!["is listening to".into(), "is watching".into()],
        kind: CommandKind::Action,
        args: vec![ArgSpec::rest("raw")],
        regex: None,
        predicate: Some(Arc::new(|_recipient, pm| pm)),
        required_privileges: Privileges::NONE,
        handler: Arc::new(move |msg, _args| {
            let score_api = score_api.clone();
            let np_cache = np_cache.clone();
            Box::pin(async move {
                let parsed = match commands::well_known::parse_np_action(&msg.message) {
                    Ok(p) => p,
                    Err(commands::well_known::NpParseError::SetNotSupported) => {
                        return Ok(vec!["The map is too old".to_string()]);
                    }
                    Err(commands::well_known::NpParseError::NoMatch) => {
                        warn!(message = %msg.message, "np: action did not match the now-playing pattern");
                        return Ok(vec![]);
                    }
                };
                let info = npcache::NpInfo::new(parsed.beatmap_id, parsed.game_mode, parsed.mods);
                if let Err(e) = np_cache.set(&msg.sender.api_identifier, &info).await {
                    warn!(error = %e, "np: failed to cache now-playing info");
                }
                let pp = score_api
                    .pp_at_accuracy(parsed.beatmap_id, parsed.game_mode.as_u8(), parsed.mods, 100.0)
                    .await?;
                Ok(vec![format!("{pp:.2}pp")])
            })
        }),
    })?;

    Ok(registry)
}

fn register_chat_message_handler(bus: &EventBus, registry: Arc<CommandRegistry>, transport: TransportHandle) {
    bus.on(
        "chat_message",
        Arc::new(move |payload: Value| {
            let registry = registry.clone();
            let transport = transport.clone();
            Box::pin(async move {
                let msg: IncomingMessage = match serde_json::from_value(payload) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(error = %e, "chat_message: malformed payload");
                        return;
                    }
                };

                let body = msg.message.clone();
                let Some(matched) = registry.resolve(&body, &msg.recipient.name, msg.pm) else {
                    return;
                };

                let target = msg.reply_target().to_string();
                let lines = commands::runtime::dispatch(&matched, msg).await;
                for line in lines {
                    if let Err(e) = transport.send(Frame::chat_message(&target, &line)) {
                        warn!(error = %e, "chat_message: failed to enqueue reply");
                    }
                }
            })
        }),
    );
}

#[derive(Deserialize)]
struct JoinedUser {
    user_id: i64,
    api_identifier: String,
    privileges: Privileges,
}

#[derive(Deserialize)]
struct MatchUserJoined {
    #[serde(rename = "match")]
    match_id: i64,
    user: JoinedUser,
}

fn register_match_user_joined_handler(bus: &EventBus, engine: Arc<tournament::TournamentEngine>) {
    bus.on(
        "match_user_joined",
        Arc::new(move |payload: Value| {
            let engine = engine.clone();
            Box::pin(async move {
                let event: MatchUserJoined = match serde_json::from_value(payload) {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(error = %e, "match_user_joined: malformed payload");
                        return;
                    }
                };
                if !engine.is_tracked(event.match_id).await {
                    return;
                }
                let is_staff = event.user.privileges.has(Privileges::USER_TOURNAMENT_STAFF);
                engine
                    .handle_user_joined(event.match_id, event.user.user_id, &event.user.api_identifier, is_staff)
                    .await;
            })
        }),
    );
}

struct PresenceChannelLister(Arc<dyn PresenceApi>);

#[async_trait]
impl ChannelLister for PresenceChannelLister {
    async fn list_channels(&self) -> Result<Vec<String>, AppError> {
        self.0.list_channels().await
    }
}

struct SessionComponent {
    fsm: SessionFsm<PresenceChannelLister>,
    inbound_rx: tokio::sync::mpsc::Receiver<transport::TransportEvent>,
}

impl Component for SessionComponent {
    fn id(&self) -> &str {
        "session"
    }

    fn run(self: Box<Self>, _shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            let Self { fsm, inbound_rx } = *self;
            fsm.run(inbound_rx).await;
            Ok(())
        })
    }
}

struct PubSubComponent {
    redis_url: String,
    ingress: pubsub::Ingress,
    rx: tokio::sync::mpsc::Receiver<(String, String)>,
    tx: tokio::sync::mpsc::Sender<(String, String)>,
    transport: TransportHandle,
}

impl Component for PubSubComponent {
    fn id(&self) -> &str {
        "pubsub"
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            let Self { redis_url, ingress, rx, tx, transport } = *self;
            let subscriber_shutdown = shutdown.child_token();
            let subscriber = tokio::spawn(pubsub::run_redis_subscriber(redis_url, tx, subscriber_shutdown.clone()));
            ingress.run(rx, transport, shutdown).await;
            subscriber_shutdown.cancel();
            let _ = subscriber.await;
            Ok(())
        })
    }
}

struct HttpApiComponent {
    bind_addr: String,
    state: httpapi::ApiState,
}

impl Component for HttpApiComponent {
    fn id(&self) -> &str {
        "httpapi"
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            let Self { bind_addr, state } = *self;
            httpapi::run(&bind_addr, state, shutdown).await
        })
    }
}

/// Polls the tournament backend for matches awaiting room creation. Roster
/// assembly and `create_match` live on the operator side that owns sign-up
/// data; this loop only surfaces what the backend reports.
struct TournamentPollComponent {
    tournament_api: Arc<HttpTournamentApi>,
}

impl Component for TournamentPollComponent {
    fn id(&self) -> &str {
        "tournament-poll"
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            let Self { tournament_api } = *self;
            let task: scheduler::Task = {
                let api = tournament_api.clone();
                Arc::new(move || {
                    let api = api.clone();
                    Box::pin(async move {
                        match api.pending_matches().await {
                            Ok(matches) if !matches.is_empty() => {
                                info!(count = matches.len(), "tournament: pending matches awaiting setup");
                            }
                            Ok(_) => {}
                            Err(e) => warn!(error = %e, "tournament: failed to poll pending matches"),
                        }
                    })
                })
            };
            let handle = scheduler::spawn_periodic(Duration::from_secs(60), task, shutdown);
            let _ = handle.await;
            Ok(())
        })
    }
}
