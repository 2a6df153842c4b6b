use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tandem::Error;
use tandem::client::{
    CallEngine, ClientConfig, ClientEvent, MediaProvider, MediaTrack, WebRtcFactory, WebRtcTrack,
    connect,
};
use tandem::model::IceServerConfig;
use tandem::server::{RelayConfig, serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(version, about = "Rendezvous relay and listener for pairwise WebRTC sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay(RelayArgs),
    /// Join a room as a receive-only participant and print what happens.
    Listen(ListenArgs),
}

#[derive(Args)]
struct RelayArgs {
    /// JSON relay config; flags override its fields.
    #[arg(long, env = "TANDEM_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "TANDEM_BIND")]
    bind: Option<IpAddr>,

    #[arg(short, long, env = "TANDEM_PORT")]
    port: Option<u16>,

    /// Allowed CORS origin, repeatable. `*` admits any.
    #[arg(long = "allow-origin", env = "TANDEM_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// ICE server URL handed to clients, repeatable.
    #[arg(long = "ice-server", env = "TANDEM_ICE_SERVERS", value_delimiter = ',')]
    ice_servers: Vec<String>,
}

impl RelayArgs {
    fn into_config(self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_json_file(path)?,
            None => RelayConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if !self.allowed_origins.is_empty() {
            config.allowed_origins = self.allowed_origins;
        }
        if !self.ice_servers.is_empty() {
            config.ice_servers = self
                .ice_servers
                .into_iter()
                .map(|url| IceServerConfig::new([url]))
                .collect();
        }
        Ok(config)
    }
}

#[derive(Args)]
struct ListenArgs {
    #[arg(long, env = "TANDEM_RELAY_URL", default_value_t = ClientConfig::default().relay_url)]
    relay: String,

    #[arg(long, default_value = "lobby")]
    room: String,

    #[arg(long, default_value = "listener")]
    identity: String,
}

/// The listener captures nothing; calls it answers are receive-only.
struct NoMedia;

#[async_trait]
impl MediaProvider<WebRtcTrack> for NoMedia {
    async fn camera(&self) -> tandem::Result<Vec<MediaTrack<WebRtcTrack>>> {
        Err(Error::MediaAcquisition("the listener has no camera".into()))
    }

    async fn screen(&self) -> tandem::Result<MediaTrack<WebRtcTrack>> {
        Err(Error::MediaAcquisition("the listener has no screen".into()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Commands::Relay(args) => {
            let config = args.into_config()?;
            println!(
                "{} {}",
                "Starting tandem relay on".green().bold(),
                config.socket_addr()
            );
            serve(config).await
        }
        Commands::Listen(args) => run_listener(args).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_listener(args: ListenArgs) -> Result<()> {
    let config = ClientConfig::default().with_relay_url(&args.relay);
    let (signaling, inbound) = connect(&config.relay_url).await?;

    let (engine, mut events) =
        CallEngine::new(WebRtcFactory, Arc::new(signaling), Arc::new(NoMedia), config);
    let pump = engine.clone();
    let mut pump_task = tokio::spawn(async move { pump.pump(inbound).await });

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if matches!(event, ClientEvent::Welcome { .. }) {
                    engine
                        .join_room(&args.room, &args.identity)
                        .await
                        .context("Failed to join")?;
                }
                print_event(&event);
            }
            _ = &mut pump_task => {
                println!("{}", "Relay closed the connection".red());
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                engine.leave_room().await?;
                println!("{}", "Left the room".yellow());
                break;
            }
        }
    }

    Ok(())
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Welcome { connection_id } => {
            println!("{} {}", "connected as".green(), connection_id)
        }
        ClientEvent::Joined { identity, room_id } => {
            println!("{} '{}' as {}", "joined".green().bold(), room_id, identity)
        }
        ClientEvent::PeerJoined {
            identity,
            connection_id,
        } => println!("{} {} ({})", "+".green(), identity, connection_id.short()),
        ClientEvent::PeerLeft {
            identity,
            connection_id,
        } => println!("{} {} ({})", "-".red(), identity, connection_id.short()),
        ClientEvent::IncomingCall { from } => {
            println!("{} {}", "incoming call from".cyan(), from.short())
        }
        ClientEvent::SessionState { remote, state } => {
            println!("   {} {}", remote.short().dimmed(), state)
        }
        ClientEvent::NegotiationFailed { remote, error } => {
            println!("{} {}: {}", "negotiation failed".red().bold(), remote.short(), error)
        }
        ClientEvent::MediaFailed { error } => println!("{} {}", "media:".yellow(), error),
        ClientEvent::RelayError { code, message } => {
            println!("{} [{:?}] {}", "relay error".red(), code, message)
        }
    }
}
