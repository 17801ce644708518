use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes. Unset means uploads are not capped here.
    #[serde(default)]
    pub body_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Upload directory of the files catalog, served under /file_uploads
    #[serde(default = "default_files_dir")]
    pub files_dir: String,
    /// Upload directory of partner logos, served under /uploads
    #[serde(default = "default_partners_dir")]
    pub partners_dir: String,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "data/bourbon.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_files_dir() -> String {
    "public/file_uploads".to_string()
}

fn default_partners_dir() -> String {
    "public/uploads".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            files_dir: default_files_dir(),
            partners_dir: default_partners_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_directories()?;
        tracing::info!(
            "Storage config: files_dir={}, partners_dir={}",
            config.storage.files_dir,
            config.storage.partners_dir
        );
        Ok(config)
    }

    /// Load configuration from conf.ini or config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["conf.ini", "config.toml", "data/conf.ini", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config = Self::parse(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    /// Format: BOURBON_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(val) = env::var("BOURBON_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("BOURBON_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = env::var("BOURBON_CONF_SERVER_BODY_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.server.body_limit = Some(limit);
            }
        }

        // Database overrides
        if let Ok(val) = env::var("BOURBON_CONF_DATABASE_PATH") {
            self.database.path = val;
        }
        if let Ok(val) = env::var("BOURBON_CONF_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                self.database.max_connections = max;
            }
        }

        // Storage overrides
        if let Ok(val) = env::var("BOURBON_CONF_STORAGE_FILES_DIR") {
            if !val.trim().is_empty() {
                self.storage.files_dir = val;
            }
        }
        if let Ok(val) = env::var("BOURBON_CONF_STORAGE_PARTNERS_DIR") {
            if !val.trim().is_empty() {
                self.storage.partners_dir = val;
            }
        }
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        // Ensure database directory exists
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.storage.files_dir)?;
        fs::create_dir_all(&self.storage.partners_dir)?;

        Ok(())
    }
}
