//! Locating, reading and overriding the bridge configuration.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ENV_PREFIX: &str = "UCI_BRIDGE";

/// File name looked up in the working directory and the platform config dir.
pub const CONFIG_FILE_NAME: &str = "bridge.toml";

/// Names a config file explicitly.
const CONFIG_PATH_ENV: &str = "UCI_BRIDGE_CONFIG";

/// The effective configuration and the file it came from, if any.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl ConfigLoader {
    /// Find a config file (see [`resolve_config_path`]), fall back to the
    /// defaults when there is none, then apply `UCI_BRIDGE_*` overrides.
    pub fn load() -> ConfigResult<Self> {
        Self::from_source(resolve_config_path())
    }

    /// Like [`load`](Self::load) with an explicit file, which must exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::from_source(Some(path.to_path_buf()))
    }

    /// Built-in defaults only.
    pub fn with_defaults() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }

    fn from_source(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match &config_path {
            Some(path) => read_config(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        write_config(&self.config, path.as_ref())
    }
}

/// First existing file among `$UCI_BRIDGE_CONFIG`, `./bridge.toml` and
/// `<platform config dir>/uci-serial-bridge/bridge.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let local = Some(PathBuf::from(CONFIG_FILE_NAME));

    [explicit, local, get_default_config_path()]
        .into_iter()
        .flatten()
        .find(|path| path.is_file())
}

pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "uci-serial-bridge")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn read_config(path: &Path) -> ConfigResult<Config> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

fn write_config(config: &Config, path: &Path) -> ConfigResult<()> {
    let write_error = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text).map_err(write_error)
}

/// Read `UCI_BRIDGE_<suffix>` and parse it.
fn env_value<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, what)),
        Err(_) => Ok(None),
    }
}

/// Apply `UCI_BRIDGE_<SECTION>_<KEY>` variables, e.g.
/// `UCI_BRIDGE_SERIAL_PORT=COM3` or `UCI_BRIDGE_LOGGING_DEBUG=1`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(val) = env_value::<String>("SERIAL_PORT", "Invalid port name")? {
        config.serial.port = val;
    }
    if let Some(val) = env_value("SERIAL_BAUD_RATE", "Invalid baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_TIMEOUT_SECS", "Invalid timeout")? {
        config.serial.timeout_secs = val;
    }

    if let Some(val) = env_value::<String>("ENGINE_NAME", "Invalid engine name")? {
        config.engine.name = val;
    }
    if let Some(val) = env_value::<String>("ENGINE_AUTHOR", "Invalid engine author")? {
        config.engine.author = val;
    }

    if let Some(val) = env_value::<String>("SEARCH_FALLBACK_MOVE", "Invalid move")? {
        config.search.fallback_move = val;
    }
    if let Some(val) = env_value("SEARCH_BUFFER_MS", "Invalid duration")? {
        config.search.buffer_ms = val;
    }
    if let Some(val) = env_value("SEARCH_DEFAULT_BUDGET_MS", "Invalid duration")? {
        config.search.default_budget_ms = val;
    }
    if let Some(val) = env_value("SEARCH_MIN_CLOCK_SHARE_MS", "Invalid duration")? {
        config.search.min_clock_share_ms = val;
    }
    if let Some(val) = env_value("SEARCH_MAX_CLOCK_SHARE_MS", "Invalid duration")? {
        config.search.max_clock_share_ms = val;
    }
    if let Some(val) = env_value("SEARCH_MAX_BUDGET_MS", "Invalid duration")? {
        config.search.max_budget_ms = val;
    }

    if let Some(val) = env_value("CONNECTION_MAX_ATTEMPTS", "Invalid attempt count")? {
        config.connection.max_attempts = val;
    }
    if let Some(val) = env_value("CONNECTION_BACKOFF_MS", "Invalid duration")? {
        config.connection.backoff_ms = val;
    }
    if let Some(val) = env_value("CONNECTION_WARMUP_MS", "Invalid duration")? {
        config.connection.warmup_ms = val;
    }

    if let Some(val) = env_value::<String>("LOGGING_DEBUG", "Invalid flag")? {
        config.logging.debug = val.eq_ignore_ascii_case("true") || val == "1";
    }
    if let Some(val) = env_value::<PathBuf>("LOGGING_FILE", "Invalid path")? {
        config.logging.file = Some(val);
    }
    if let Some(val) = env_value("LOGGING_FORMAT", "Invalid log format")? {
        config.logging.format = val;
    }

    Ok(())
}
