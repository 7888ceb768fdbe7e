use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::question::Bank;
use crate::session::{SessionConfig, DEFAULT_FADE_MS, DEFAULT_PENALTY_SECS};
use crate::timer::{Countdown, DEFAULT_INTERVAL_MS, DEFAULT_START_SECS};
use crate::view::DEFAULT_TOAST_MS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_secs: u32,
    pub penalty_secs: u32,
    pub tick_ms: u64,
    pub fade_ms: u64,
    pub toast_ms: u64,
    pub bank: Bank,
    pub shuffle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_secs: DEFAULT_START_SECS,
            penalty_secs: DEFAULT_PENALTY_SECS,
            tick_ms: DEFAULT_INTERVAL_MS,
            fade_ms: DEFAULT_FADE_MS,
            toast_ms: DEFAULT_TOAST_MS,
            bank: Bank::Javascript,
            shuffle: false,
        }
    }
}

impl Config {
    pub fn countdown(&self) -> Countdown {
        Countdown::new(self.time_secs, Duration::from_millis(self.tick_ms.max(1)))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            penalty_secs: self.penalty_secs,
            fade: Duration::from_millis(self.fade_ms),
        }
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("kwiz_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable config {}: {err}", self.path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
