use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("identity store error: {0}")]
    IdentityError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteFmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("transfer error: {0}")]
    Transfer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("server.url must start with ws://".into());
        assert_eq!(
            err.to_string(),
            "config validation error: server.url must start with ws://"
        );

        let err = ConfigError::IdentityError("read-only filesystem".into());
        assert_eq!(err.to_string(), "identity store error: read-only filesystem");
    }

    #[test]
    fn remotefm_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: RemoteFmError = config_err.into();
        assert!(matches!(err, RemoteFmError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn remotefm_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: RemoteFmError = io_err.into();
        assert!(matches!(err, RemoteFmError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn remotefm_error_other_variants() {
        let err = RemoteFmError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = RemoteFmError::Transfer("offset mismatch".into());
        assert_eq!(err.to_string(), "transfer error: offset mismatch");
    }
}
