use clap::Parser;
use notify_relay::notifications::senders::webhook::WebhookSender;
use notify_relay::notifications::service::RelayService;
use notify_relay::registry::{RelayConfig, Registry};
use notify_relay::server::config::ServerConfig;
use notify_relay::server::{heartbeat, logging, signals};
use notify_relay::version::VERSION;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relays client notifications to chat webhooks", long_about = None)]
struct Args {
    /// Path to the server settings file
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the relay document (secret, channels, clients)
    #[arg(short, long)]
    relay_config: Option<PathBuf>,

    /// Port to listen on, overriding the configured listen address port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Plain version line, checked before clap so no other argument is required.
    if std::env::args().any(|arg| arg == "--version") {
        println!("Relay version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    let mut server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };
    if let Some(path) = args.relay_config {
        server_config.relay_config_path = path;
    }

    logging::init_logging(&server_config.log_dir);
    info!("Starting relay, version: {}", VERSION);

    let mut addr: SocketAddr = server_config.listen_address.parse()?;
    if let Some(port) = args.port {
        addr.set_port(port);
    }

    // --- Relay Registry Setup ---
    // A bad relay document at startup is fatal; at reload it is only reported.
    let relay_config = RelayConfig::load(&server_config.relay_config_path).map_err(|e| {
        error!(path = %server_config.relay_config_path.display(), error = %e, "Failed to load relay configuration.");
        e
    })?;
    let registry = Registry::build(&relay_config).map_err(|e| {
        error!(error = %e, "Invalid relay configuration.");
        e
    })?;
    info!(
        clients = registry.client_count(),
        channels = registry.channel_count(),
        notify_route = registry.notify_route(),
        "Relay registry built."
    );

    let sender = Arc::new(WebhookSender::new(server_config.relay_timeout)?);
    let relay = Arc::new(RelayService::new(registry, sender));
    // Relay URLs carry client tokens; they are only printed on SIGUSR1/SIGUSR2.

    let server_config = Arc::new(server_config);

    // --- Self Check Task ---
    let self_check_task = tokio::spawn(heartbeat::run_self_check(relay.clone()));

    // --- Signal Task ---
    let signal_task = tokio::spawn(signals::listen_signals(
        relay.clone(),
        server_config.relay_config_path.clone(),
    ));

    // --- Axum HTTP Server Setup ---
    let app = notify_relay::web::create_axum_router(relay.clone(), server_config.clone());

    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, "HTTP server listening with TCP Keepalive");

    axum::serve(listener, app)
        .with_graceful_shutdown(signals::shutdown_signal())
        .await
        .map_err(Box::new)?;

    self_check_task.abort();
    signal_task.abort();
    info!("Relay stopped.");

    Ok(())
}
