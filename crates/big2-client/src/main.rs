//! Big 2 Live terminal client: entry point.
//!
//! Wires the socket session, toast service, identity store and room session
//! use case together, then runs an interactive prompt.  The `admin`
//! subcommand talks to the server's admin HTTP API instead.
//!
//! # Usage
//!
//! ```text
//! big2-client [OPTIONS] [COMMAND]
//!
//! Commands:
//!   play    Play interactively (default)
//!   admin   Server administration
//!
//! Options:
//!   --server-url <URL>     Game server base URL [env: BIG2_SERVER_URL]
//!   --api-base-url <URL>   Admin API base URL [env: BIG2_API_BASE_URL]
//!   --username <NAME>      Name to play under [env: BIG2_USERNAME]
//!   --room <ROOM>          Room to join on start [env: BIG2_ROOM]
//!   --config <PATH>        Config file [env: BIG2_CONFIG]
//! ```
//!
//! Command-line values win over the config file, which wins over the
//! built-in defaults.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ SocketSession::connect()       -- Socket.IO reconnect loop
//!  └─ dispatch_session_events()      -- server events -> RoomSessionUseCase
//!  └─ toast printer                  -- ToastService events -> stdout
//!  └─ prompt loop                    -- stdin -> Terminal -> use case
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use big2_client::application::ports::IdentityRepository;
use big2_client::application::room_session::RoomSessionUseCase;
use big2_client::application::session_state::JoinForm;
use big2_client::infrastructure::admin_api::{AdminApi, NewAnnouncement, DEFAULT_ANNOUNCEMENT_DURATION_MS};
use big2_client::infrastructure::connection::{SessionEvent, SocketSession, SocketSessionConfig};
use big2_client::infrastructure::dispatch::dispatch_session_events;
use big2_client::infrastructure::storage::config::{load_config, load_config_from, ClientConfig, ConfigError};
use big2_client::infrastructure::storage::identity::IdentityStore;
use big2_client::infrastructure::subscription::Subscription;
use big2_client::infrastructure::terminal::command::parse_command;
use big2_client::infrastructure::terminal::render::render_toast;
use big2_client::infrastructure::terminal::{Flow, Terminal};
use big2_client::infrastructure::toast_service::ToastService;
use big2_core::domain::names::{validate, NameKind};
use big2_core::domain::toast::{Severity, ToastEvent};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "big2-client", about = "Terminal client for Big 2 Live", version)]
struct Cli {
    /// Game server base URL, e.g. `https://api.big2.prestontang.dev`.
    #[arg(long, env = "BIG2_SERVER_URL")]
    server_url: Option<String>,

    /// Admin API base URL.  Defaults to the server URL.
    #[arg(long, env = "BIG2_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Name to play under.  Remembered for the next run.
    #[arg(long, env = "BIG2_USERNAME")]
    username: Option<String>,

    /// Room to join as soon as the connection is up.
    #[arg(long, env = "BIG2_ROOM")]
    room: Option<String>,

    /// Config file to use instead of the platform default.
    #[arg(long, env = "BIG2_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play interactively (default).
    Play,
    /// Server administration.
    Admin {
        /// Log in with this password before running the action.
        #[arg(long, env = "BIG2_ADMIN_PASSWORD")]
        password: Option<String>,

        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Debug, Subcommand)]
enum AdminAction {
    /// Show whether the session is logged in.
    Status,
    Rooms,
    Players,
    /// Close a room and remove everyone in it.
    CloseRoom { room: String },
    /// Show the AI model settings.
    Ai,
    SetModel { model: String },
    /// Show the active announcement.
    Announcement,
    /// Broadcast an announcement to all players.
    Announce {
        message: String,
        #[arg(long = "type", default_value = "info")]
        severity: Severity,
        #[arg(long, default_value_t = DEFAULT_ANNOUNCEMENT_DURATION_MS)]
        duration_ms: u64,
    },
    ClearAnnouncement,
    Logout,
}

/// Effective settings after merging the CLI over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    server_url: String,
    api_base_url: String,
    reconnect_interval: Duration,
    toast_capacity: usize,
    toast_duration: Duration,
    log_level: String,
}

impl Cli {
    fn settings(&self, config: &ClientConfig) -> Settings {
        let server_url = self.server_url.clone().unwrap_or_else(|| config.server.url.clone());
        let api_base_url = self
            .api_base_url
            .clone()
            .or_else(|| config.server.api_base_url.clone())
            .unwrap_or_else(|| server_url.clone());
        Settings {
            server_url,
            api_base_url,
            reconnect_interval: config.server.reconnect_interval(),
            toast_capacity: config.toasts.capacity,
            toast_duration: config.toasts.duration(),
            log_level: config.client.log_level.clone(),
        }
    }

    fn load_config(&self) -> anyhow::Result<ClientConfig> {
        match &self.config {
            Some(path) => load_config_from(path).with_context(|| format!("reading {}", path.display())),
            None => load_config().or_else(|e| match e {
                ConfigError::NoPlatformConfigDir => Ok(ClientConfig::default()),
                other => Err(other).context("reading the client config"),
            }),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let settings = cli.settings(&config);

    // RUST_LOG wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    match &cli.command {
        Some(Commands::Admin { password, action }) => run_admin(&settings, password.as_deref(), action).await,
        Some(Commands::Play) | None => run_play(&cli, &settings).await,
    }
}

async fn run_play(cli: &Cli, settings: &Settings) -> anyhow::Result<()> {
    info!("Big 2 Live client starting; server {}", settings.server_url);

    let toasts = Arc::new(ToastService::new(settings.toast_capacity, settings.toast_duration));
    let identity = Arc::new(IdentityStore::in_config_dir().unwrap_or_else(|e| {
        warn!("{e}; remembering identity in the temp directory");
        IdentityStore::new(std::env::temp_dir().join("big2live-identity.toml"))
    }));
    let username = cli_username(cli.username.as_deref());
    if let Some(username) = &username {
        identity.save_username(username);
    }

    let socket = Arc::new(
        SocketSession::new(SocketSessionConfig {
            server_url: settings.server_url.clone(),
            reconnect_interval: settings.reconnect_interval,
            ..Default::default()
        })
        .context("invalid server URL")?,
    );
    let session = Arc::new(RoomSessionUseCase::new(socket.clone(), toasts.clone(), identity));
    let terminal = Terminal::new(session.clone());

    // ── Event pumps ───────────────────────────────────────────────────────────
    let redraw = Arc::new(Notify::new());
    let redraw_tx = Arc::clone(&redraw);
    tokio::spawn(dispatch_session_events(
        Subscription::all(socket.subscribe()),
        session.clone(),
        move |event| {
            if !matches!(event, SessionEvent::Disconnected) {
                redraw_tx.notify_one();
            }
        },
    ));

    let mut toast_rx = toasts.subscribe();
    let toast_view = Arc::clone(&toasts);
    tokio::spawn(async move {
        while let Ok(event) = toast_rx.recv().await {
            if let ToastEvent::Added(id) = event {
                if let Some(toast) = toast_view.toasts().iter().find(|t| t.id == id) {
                    println!("{}", render_toast(toast));
                }
            }
        }
    });

    let mut ready = socket.subscribe_to(&[]);
    socket.connect();

    if let Some(room_name) = cli.room.clone() {
        match tokio::time::timeout(Duration::from_secs(10), ready.recv()).await {
            Ok(Some(SessionEvent::Connected { .. })) => {
                let username = match username {
                    Some(name) => name,
                    None => session.snapshot().await.username().to_string(),
                };
                session.join_room(JoinForm { room_name, username }).await;
            }
            _ => warn!("not connected yet; skipping --room"),
        }
    }
    drop(ready);

    // ── Prompt loop ───────────────────────────────────────────────────────────
    println!("type `help` for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else { break };
                match parse_command(&line) {
                    Ok(Some(command)) => match terminal.execute(command).await {
                        Flow::Quit => break,
                        Flow::Continue(Some(output)) => println!("{output}"),
                        Flow::Continue(None) => {}
                    },
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            _ = redraw.notified() => println!("{}", terminal.screen().await),
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    socket.disconnect().await;
    toasts.shutdown();
    info!("Big 2 Live client stopped");
    Ok(())
}

/// The `--username` value, cleaned up, or `None` if it is not a valid name.
fn cli_username(raw: Option<&str>) -> Option<String> {
    match validate(raw?, NameKind::Username) {
        Ok(name) => Some(name),
        Err(e) => {
            warn!("ignoring --username: {e}");
            None
        }
    }
}

async fn run_admin(settings: &Settings, password: Option<&str>, action: &AdminAction) -> anyhow::Result<()> {
    let api = AdminApi::new(&settings.api_base_url).context("invalid admin API URL")?;
    if let Some(password) = password {
        api.login(password).await.context("login failed")?;
    }

    match action {
        AdminAction::Status => {
            let authenticated = api.session().await?;
            println!("{}", if authenticated { "logged in" } else { "not logged in" });
        }
        AdminAction::Rooms => {
            for room in api.rooms().await? {
                let names: Vec<&str> = room.players.iter().map(|p| p.name.as_str()).collect();
                println!("{:<24} {} players  {:<9} {}", room.name, room.player_count, room.status, names.join(", "));
            }
        }
        AdminAction::Players => {
            for player in api.players().await? {
                println!(
                    "{:<24} {:<22} {:<16} {}",
                    player.name,
                    player.socket_id.as_deref().unwrap_or("-"),
                    player.room_name.as_deref().unwrap_or("-"),
                    player.kind_label()
                );
            }
        }
        AdminAction::CloseRoom { room } => {
            api.close_room(room).await?;
            println!("closed {room}");
        }
        AdminAction::Ai => {
            let ai = api.ai_settings().await?;
            println!("model:   {} (default {})", ai.llm_model, ai.default_llm_model);
            println!("api key: {}", if ai.has_open_router_key { "configured" } else { "missing" });
        }
        AdminAction::SetModel { model } => {
            let model = api.set_ai_model(model).await?;
            println!("LLM model set to: {model}");
        }
        AdminAction::Announcement => match api.announcement().await? {
            Some(a) => println!("[{}] {} (expires {:?})", a.severity, a.message, a.expires_at),
            None => println!("no active announcement"),
        },
        AdminAction::Announce { message, severity, duration_ms } => {
            let announcement = NewAnnouncement { message: message.clone(), severity: *severity, duration_ms: *duration_ms };
            api.publish_announcement(&announcement).await?;
            println!("Announcement sent.");
        }
        AdminAction::ClearAnnouncement => {
            api.clear_announcement().await?;
            println!("Announcement cleared.");
        }
        AdminAction::Logout => {
            api.logout().await?;
            println!("logged out");
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
