//! remotefm-relay: WebSocket hub between device agents and admin consoles.
//!
//! Devices connect on `/ws/device` and register; admins connect on
//! `/ws/admin`, see the device directory and address envelopes to a device
//! by `device_id`. Payloads are forwarded without interpretation.

mod connection;
mod directory;
mod server;


use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use crate::directory::Directory;

#[derive(Parser)]
#[command(name = "remotefm-relay", about = "WebSocket relay between remotefm devices and admins")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Seconds an offline device stays listed before it is forgotten.
    #[arg(long, default_value_t = 3600)]
    offline_ttl: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remotefm_relay=info".into()),
        )
        .init();

    let args = Args::parse();
    let dir = Directory::new();

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind TCP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("remotefm-relay listening on {}", addr);

    tokio::spawn(server::reap_forever(
        dir.clone(),
        Duration::from_secs(args.offline_ttl),
    ));

    server::serve(listener, dir).await;
    ExitCode::SUCCESS
}
