//! Environment-driven server configuration.

use std::path::PathBuf;

/// Used when no lecturer token is configured. Development only.
pub const DEV_LECTURER_TOKEN: &str = "dev-secret-123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Write-ahead log under `data_dir`.
    Wal,
    /// Nothing survives a restart.
    Memory,
}

impl std::str::FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wal" | "file" => Ok(StorageKind::Wal),
            "memory" | "mem" => Ok(StorageKind::Memory),
            other => Err(format!("unknown storage kind: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub lecturer_token: String,
    /// True when `lecturer_token` fell back to [`DEV_LECTURER_TOKEN`].
    pub using_dev_token: bool,
    pub metrics_port: Option<u16>,
    pub compact_threshold: u64,
    pub static_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("storage", &self.storage)
            .field("lecturer_token", &"<redacted>")
            .field("using_dev_token", &self.using_dev_token)
            .field("metrics_port", &self.metrics_port)
            .field("compact_threshold", &self.compact_threshold)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable numbers fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let bind = get("LECTERN_BIND").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("LECTERN_PORT")
            .or_else(|| get("PORT"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let data_dir = PathBuf::from(get("LECTERN_DATA_DIR").unwrap_or_else(|| "./data".into()));
        let storage = match get("LECTERN_STORAGE") {
            Some(s) => s.parse()?,
            None => StorageKind::Wal,
        };
        let token = get("LECTERN_LECTURER_TOKEN")
            .or_else(|| get("LECTURER_TOKEN"))
            .filter(|t| !t.is_empty());
        let using_dev_token = token.is_none();
        let lecturer_token = token.unwrap_or_else(|| DEV_LECTURER_TOKEN.into());
        let metrics_port: Option<u16> = get("LECTERN_METRICS_PORT").and_then(|s| s.parse().ok());
        let compact_threshold: u64 = get("LECTERN_COMPACT_THRESHOLD")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);
        let static_dir = get("LECTERN_STATIC_DIR").map(PathBuf::from);

        Ok(Self {
            bind,
            port,
            data_dir,
            storage,
            lecturer_token,
            using_dev_token,
            metrics_port,
            compact_threshold,
            static_dir,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("lectern.wal")
    }
}
