use super::*;

#[test]
fn default_config_is_valid() {
    assert!(validate(&RemoteFmConfig::default()).is_ok());
}

#[test]
fn rejects_http_url() {
    let mut config = RemoteFmConfig::default();
    config.server.url = "http://127.0.0.1:8000/ws/device".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.url"));
}

#[test]
fn rejects_url_without_host() {
    let mut config = RemoteFmConfig::default();
    config.admin.url = "wss://".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("admin.url"));
}

#[test]
fn rejects_chunk_size_out_of_range() {
    let mut config = RemoteFmConfig::default();
    config.transfer.chunk_size = 16;
    assert!(validate(&config).is_err());

    config.transfer.chunk_size = MAX_CHUNK_SIZE + 1;
    assert!(validate(&config).is_err());

    config.transfer.chunk_size = MAX_CHUNK_SIZE;
    assert!(validate(&config).is_ok());
}

#[test]
fn rejects_zero_reconnect_delay() {
    let mut config = RemoteFmConfig::default();
    config.server.reconnect_delay_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.reconnect_delay_secs = 0"));
}

#[test]
fn collects_all_errors() {
    let mut config = RemoteFmConfig::default();
    config.server.url = "nope".into();
    config.transfer.pacing_ms = 5000;
    config.device.name = "  ".into();

    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.url"));
    assert!(err.contains("transfer.pacing_ms"));
    assert!(err.contains("device.name"));
}
