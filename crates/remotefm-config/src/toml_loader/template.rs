//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# remotefm configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# url = "ws://127.0.0.1:8000/ws/device"
# reconnect_delay_secs = 5     # 1-3600
# ping_interval_secs = 30      # 5-3600
# connect_timeout_secs = 15

[device]
# name = ""                    # defaults to the host name
# platform_version = ""        # defaults to the OS name
# api_level = 0
# credential = "default_key"   # shared placeholder, not a secret

[transfer]
# chunk_size = 65536           # 1024-4194304 bytes
# pacing_ms = 10               # 0-1000

[admin]
# url = "ws://127.0.0.1:8000/ws/admin"
# download_dir = "."
# response_timeout_secs = 30

[logging]
# level = "info"               # trace, debug, info, warn, error
"##
    .to_string()
}
