//! # gb-config
//!
//! Layered settings for the guestbook binaries:
//! built-in defaults, then an optional TOML file, then `GUESTBOOK__*`
//! environment variables, then command-line overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "guestbook.toml";
pub const ENV_PREFIX: &str = "GUESTBOOK";

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Source could not be read or did not match the settings shape
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// Settings parsed but violate a constraint
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub journal: JournalSettings,
    pub log: LogSettings,
    pub assets: AssetSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address {}:{}: {e}", self.host, self.port)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalSettings {
    /// Directory holding `visitor-log-<date>.csv` files
    pub path: PathBuf,
    /// Record "<client address>;<user agent>" in a `Source` column
    pub include_source: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Directory for the diagnostic log (`log.txt`)
    pub dir: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetSettings {
    /// Served under `/images`
    pub images_dir: PathBuf,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub journal_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// Loads settings. `config_file` defaults to `guestbook.toml` in the working
/// directory; a missing file is not an error.
pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    tracing::debug!(file = %file.display(), "loading settings");

    let settings: Settings = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 80_i64)?
        .set_default("journal.path", "../journal")?
        .set_default("journal.include_source", true)?
        .set_default("log.dir", "../logs")?
        .set_default("log.level", "info")?
        .set_default("log.format", "pretty")?
        .set_default("assets.images_dir", "images")?
        .add_source(File::from(file).required(config_file.is_some()))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("server.port", overrides.port.map(i64::from))?
        .set_override_option("journal.path", overrides.journal_path.as_deref().map(path_value))?
        .set_override_option("log.dir", overrides.log_dir.as_deref().map(path_value))?
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.journal.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("journal.path must not be empty".into()));
        }
        if self.log.dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("log.dir must not be empty".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
