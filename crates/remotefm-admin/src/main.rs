//! remotefm-admin: command-line admin console.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use remotefm_admin::AdminClient;
use remotefm_common::{ConfigError, RemoteFmError};
use remotefm_config::{load_config, validate, RemoteFmConfig};
use remotefm_protocol::{FileEntry, Message};
use remotefm_session::{Role, SessionConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "remotefm-admin", version, about = "remotefm admin console")]
struct Args {
    /// Config file path override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Relay admin endpoint, e.g. ws://host:8000/ws/admin.
    #[arg(long)]
    url: Option<String>,

    /// Seconds to wait for a reply before giving up.
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List devices known to the relay.
    Devices,
    /// List a directory on a device.
    Ls { device: String, path: String },
    /// Download a file.
    Get {
        device: String,
        path: String,
        /// Directory to save into (default: `[admin] download_dir`).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upload a local file.
    Put {
        device: String,
        local: PathBuf,
        remote: String,
    },
    /// Delete a file or directory.
    Rm {
        device: String,
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Create a directory and its missing parents.
    Mkdir { device: String, path: String },
    /// Move or rename.
    Mv {
        device: String,
        old: String,
        new: String,
    },
    /// Zip a directory on the device and download the archive.
    Zip {
        device: String,
        path: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show device metadata.
    Info { device: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = load_config(args.config.as_deref());
    let config_level = loaded.as_ref().ok().map(|c| c.logging.level.as_str());
    init_logging(args.log_level.as_deref().or(config_level).unwrap_or("warn"));

    match run(args, loaded).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "remotefm-admin failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args, loaded: Result<RemoteFmConfig, ConfigError>) -> Result<(), RemoteFmError> {
    let mut config = loaded?;
    if let Some(url) = args.url {
        config.admin.url = url;
    }
    if let Some(timeout) = args.timeout {
        config.admin.response_timeout_secs = timeout;
    }
    validate(&config)?;

    let download_dir = match &args.command {
        Command::Get { out: Some(out), .. } | Command::Zip { out: Some(out), .. } => out.clone(),
        _ => PathBuf::from(&config.admin.download_dir),
    };
    let timeout = Duration::from_secs(config.admin.response_timeout_secs);

    let mut session = SessionConfig::new(config.admin.url.clone(), Role::Admin);
    session.connect_timeout = timeout;
    session.ping_interval = Duration::from_secs(config.server.ping_interval_secs);

    let mut client = AdminClient::connect(session, download_dir, timeout)
        .await
        .map_err(network)?
        .with_transfer(
            config.transfer.chunk_size,
            Duration::from_millis(config.transfer.pacing_ms),
        );

    let result = execute(&mut client, args.command).await;
    client.close().await;
    result
}

async fn execute(client: &mut AdminClient, command: Command) -> Result<(), RemoteFmError> {
    match command {
        Command::Devices => {
            let devices = client.devices().await.map_err(network)?;
            if devices.is_empty() {
                println!("no devices");
            }
            for device in devices {
                println!(
                    "{}\t{:?}\t{}\t{}\t{}\t{}",
                    device.id,
                    device.status,
                    device.device_name,
                    device.android_version,
                    device.ip,
                    device.connected_at
                );
            }
        }
        Command::Ls { device, path } => {
            let files = client.list(&device, &path).await.map_err(network)?;
            for entry in &files {
                println!("{}", format_entry(entry));
            }
        }
        Command::Get { device, path, .. } => {
            let saved = client.download(&device, &path).await.map_err(transfer)?;
            println!("saved {} ({} bytes)", saved.path.display(), saved.bytes);
        }
        Command::Zip { device, path, .. } => {
            let saved = client.compress(&device, &path).await.map_err(transfer)?;
            println!("saved {} ({} bytes)", saved.path.display(), saved.bytes);
        }
        Command::Put {
            device,
            local,
            remote,
        } => {
            let bytes = client
                .upload(&device, &local, &remote)
                .await
                .map_err(transfer)?;
            println!("sent {bytes} bytes to {remote}");
        }
        Command::Rm {
            device,
            path,
            recursive,
        } => {
            println!("{}", client.delete(&device, &path, recursive).await.map_err(network)?);
        }
        Command::Mkdir { device, path } => {
            println!("{}", client.create_dir(&device, &path).await.map_err(network)?);
        }
        Command::Mv { device, old, new } => {
            println!("{}", client.move_path(&device, &old, &new).await.map_err(network)?);
        }
        Command::Info { device } => {
            if let Message::DeviceInfo {
                device_id,
                device_name,
                platform_version,
                api_level,
            } = client.device_info(&device).await.map_err(network)?
            {
                println!("id:       {device_id}");
                println!("name:     {device_name}");
                println!("platform: {platform_version}");
                println!("api:      {api_level}");
            }
        }
    }
    Ok(())
}

fn format_entry(entry: &FileEntry) -> String {
    let kind = if entry.is_directory { 'd' } else { '-' };
    format!("{kind} {:>12}  {}", entry.size, entry.name)
}

fn network(e: remotefm_admin::AdminError) -> RemoteFmError {
    RemoteFmError::Network(e.to_string())
}

fn transfer(e: remotefm_admin::AdminError) -> RemoteFmError {
    RemoteFmError::Transfer(e.to_string())
}
