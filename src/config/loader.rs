//! Configuration loading from disk plus command-line overrides.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("validation failed: {}", render(.0))]
    Validation(Vec<ValidationError>),
}

fn render(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Settings given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub debug: bool,
    /// Port for the discovery listener; the host part is kept.
    pub ads_port: Option<u16>,
    pub watch: bool,
    pub directories: Vec<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, config: &mut ServerConfig) {
        if self.debug {
            config.observability.log_level = "debug".to_string();
        }
        if let Some(port) = self.ads_port {
            config.listener.bind_address = with_port(&config.listener.bind_address, port);
        }
        if self.watch {
            config.sources.watch = true;
        }
        if !self.directories.is_empty() {
            config.sources.directories = self.directories.clone();
        }
    }
}

fn with_port(address: &str, port: u16) -> String {
    match address.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => format!("0.0.0.0:{}", port),
    }
}

/// Parse a TOML config file without validating it.
pub fn parse_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the file (or defaults), apply overrides, then validate.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(path)?,
        None => ServerConfig::default(),
    };
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.toml");
        fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:19000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:19000");
        assert_eq!(config.listener.max_sessions, 10_000);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.distribution.suppress_identical_pushes);
    }

    #[test]
    fn overrides_win() {
        let overrides = Overrides {
            debug: true,
            ads_port: Some(18123),
            watch: true,
            directories: vec![PathBuf::from("/etc/plane")],
        };
        let config = load_config(None, &overrides).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:18123");
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.sources.watch);
        assert_eq!(config.sources.directories, vec![PathBuf::from("/etc/plane")]);
    }

    #[test]
    fn unknown_log_format_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.toml");
        fs::write(&path, "[observability]\nlog_format = \"xml\"\n").unwrap();
        assert!(matches!(
            load_config(Some(&path), &Overrides::default()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml")), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
