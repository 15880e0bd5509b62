//! remotefm-agent: exposes this machine's filesystem to the admin console
//! through the relay.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use remotefm_agent::{AgentRouter, DeviceProfile, TransferSettings};
use remotefm_common::{ConfigError, RemoteFmError};
use remotefm_config::{
    default_config_path, load_config, load_or_create_device_id, save_config_to_path, validate,
    RemoteFmConfig, ServerConfig,
};
use remotefm_session::{Role, SessionConfig, SessionHandle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "remotefm-agent", version, about = "remotefm device agent")]
struct Args {
    /// Config file path override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Relay device endpoint, e.g. ws://host:8000/ws/device. Saved to the config file.
    #[arg(long)]
    server_url: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = load(args.config.clone());
    let config_level = loaded.as_ref().ok().map(|(_, c)| c.logging.level.as_str());
    init_logging(args.log_level.as_deref().or(config_level));

    match run(args, loaded).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "remotefm-agent failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: Option<&str>) {
    let level = level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load(path: Option<PathBuf>) -> Result<(PathBuf, RemoteFmConfig), ConfigError> {
    let path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = load_config(Some(&path))?;
    Ok((path, config))
}

fn session_config(server: &ServerConfig) -> SessionConfig {
    let mut config = SessionConfig::new(server.url.clone(), Role::Device);
    config.reconnect_delay = Duration::from_secs(server.reconnect_delay_secs);
    config.ping_interval = Duration::from_secs(server.ping_interval_secs);
    config.connect_timeout = Duration::from_secs(server.connect_timeout_secs);
    config
}

async fn run(
    args: Args,
    loaded: Result<(PathBuf, RemoteFmConfig), ConfigError>,
) -> Result<(), RemoteFmError> {
    let (config_path, mut config) = loaded?;

    if let Some(url) = args.server_url {
        config.server.url = url;
        validate(&config)?;
        save_config_to_path(&config, &config_path)?;
        tracing::info!(url = %config.server.url, path = %config_path.display(), "Saved server URL");
    }
    validate(&config)?;

    let device_id = load_or_create_device_id()?;
    let profile = DeviceProfile::from_config(device_id, &config.device);
    tracing::info!(
        device = %profile.device_id,
        name = %profile.device_name,
        server = %config.server.url,
        "Starting device agent"
    );

    let router = AgentRouter::new(profile, TransferSettings::from(&config.transfer));
    let session = SessionHandle::start(session_config(&config.server), router);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, stopping");
    session.stop().await;
    Ok(())
}
