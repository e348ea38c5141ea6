mod api;

use clap::{Parser, Subcommand};
use std::net::{IpAddr, UdpSocket};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, reload, EnvFilter};
use wagate_core::{auth::AuthState, config};
use wagate_whatsapp::{SessionManager, WhatsAppBackend};

#[derive(Parser)]
#[command(
    name = "wagate",
    version,
    about = "HTTP gateway for a WhatsApp Web session"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// HTTP port, overrides `api.port`.
    #[arg(long, env = "PORT", global = true)]
    port: Option<u16>,

    /// Auth-state directory, overrides `whatsapp.auth_dir`.
    #[arg(long, env = "WAGATE_AUTH_DIR", global = true)]
    auth_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to WhatsApp and serve the HTTP API (default).
    Start,
    /// Print the effective configuration and pairing state.
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging comes up before the config is read; `gateway.log_level`
    // replaces the startup filter unless RUST_LOG is set.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut cfg = config::load(&cli.config)?;
    cfg.apply_overrides(cli.port, cli.auth_dir.clone());

    if !from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&cfg.gateway.log_level)) {
            warn!("failed to apply log level '{}': {e}", cfg.gateway.log_level);
        }
    }

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => start(cfg).await?,
        Commands::Status => {
            println!("{}: Status Check\n", cfg.gateway.name);
            println!("Config: {}", cli.config);
            println!("API: {}:{}", cfg.api.host, cfg.api.port);
            println!("Auth dir: {}", cfg.whatsapp.auth_dir);
            println!(
                "Reconnect delay: {}ms, relogin delay: {}ms",
                cfg.whatsapp.reconnect_delay_ms, cfg.whatsapp.relogin_delay_ms
            );
            println!();

            let paired = std::path::Path::new(&cfg.whatsapp.auth_dir).is_dir()
                && AuthState::load_or_create(&cfg.whatsapp.auth_dir)?.is_registered();
            println!(
                "  whatsapp: {}",
                if paired { "paired" } else { "not paired" }
            );
        }
    }

    Ok(())
}

async fn start(cfg: config::Config) -> anyhow::Result<()> {
    let backend = Arc::new(WhatsAppBackend::new(cfg.whatsapp.device_name.clone()));
    let session = SessionManager::new(backend, cfg.whatsapp.clone());

    // The API answers from whatever state exists while the first connect runs.
    session.start();

    let listener = api::bind(&cfg.api).await?;
    print_banner(&cfg);
    info!("{} started", cfg.gateway.name);
    api::serve(listener, &cfg.api, session).await
}

fn print_banner(cfg: &config::Config) {
    let port = cfg.api.port;
    println!("{} running", cfg.gateway.name);
    println!("  Local:   http://localhost:{port}");
    println!("  Network: http://{}:{port}", lan_ip());
    println!();
    println!("  GET  /api/qr      QR code for pairing");
    println!("  POST /api/send    send a text message");
    println!("  GET  /api/status  connection status");
    println!("  POST /api/logout  log out and re-pair");
    println!();
}

/// LAN IPv4 address of the outbound interface, or `localhost` when there
/// is none.
fn lan_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .ok()
        .and_then(|addr| lan_host(addr.ip()))
        .unwrap_or_else(|| "localhost".to_string())
}

fn lan_host(ip: IpAddr) -> Option<String> {
    match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_lan_host_accepts_private_ipv4() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(lan_host(ip).as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn test_lan_host_rejects_loopback_unspecified_and_ipv6() {
        assert_eq!(lan_host(IpAddr::V4(Ipv4Addr::LOCALHOST)), None);
        assert_eq!(lan_host(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), None);
        assert_eq!(lan_host(IpAddr::V6(Ipv6Addr::LOCALHOST)), None);
        assert_eq!(
            lan_host(IpAddr::V6("fe80::1".parse().unwrap())),
            None
        );
    }
}
