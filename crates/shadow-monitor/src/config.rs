use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::FilePattern;

pub const DEFAULT_FILE_PATTERN: &str = "*.*";
pub const DEFAULT_QUEUE_WARN_THRESHOLD: usize = 1024;

/// Fixed for the lifetime of a monitor once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub monitor_dir: PathBuf,
    #[serde(default)]
    pub shadow_dir: PathBuf,
    #[serde(default)]
    pub purge_shadow: bool,
    #[serde(default)]
    pub suppress_binary_display: bool,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default = "default_queue_warn_threshold")]
    pub queue_warn_threshold: usize,
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_queue_warn_threshold() -> usize {
    DEFAULT_QUEUE_WARN_THRESHOLD
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitor_dir: PathBuf::new(),
            shadow_dir: PathBuf::new(),
            purge_shadow: false,
            suppress_binary_display: false,
            file_pattern: default_file_pattern(),
            queue_warn_threshold: default_queue_warn_threshold(),
        }
    }
}

impl MonitorConfig {
    pub fn new(monitor_dir: impl Into<PathBuf>, shadow_dir: impl Into<PathBuf>) -> Self {
        Self {
            monitor_dir: monitor_dir.into(),
            shadow_dir: shadow_dir.into(),
            ..Self::default()
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: MonitorConfig = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Expand a leading `~` in both directory paths.
    pub fn expand_paths(mut self) -> Self {
        self.monitor_dir = expand(&self.monitor_dir);
        self.shadow_dir = expand(&self.shadow_dir);
        self
    }

    pub fn file_pattern(&self) -> Result<FilePattern> {
        FilePattern::new(&self.file_pattern)
    }

    /// Reject configurations the monitor cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.monitor_dir.as_os_str().is_empty() {
            return Err(anyhow!("monitored directory is required"));
        }
        if self.shadow_dir.as_os_str().is_empty() {
            return Err(anyhow!("shadow directory is required"));
        }
        if !self.monitor_dir.is_dir() {
            return Err(anyhow!(
                "monitored directory {} does not exist or is not a directory",
                self.monitor_dir.display()
            ));
        }
        // snapshots written into the watched directory would be captured again
        if self.shadow_dir.exists() {
            let monitor = self
                .monitor_dir
                .canonicalize()
                .with_context(|| format!("resolve {}", self.monitor_dir.display()))?;
            let shadow = self
                .shadow_dir
                .canonicalize()
                .with_context(|| format!("resolve {}", self.shadow_dir.display()))?;
            if monitor == shadow {
                return Err(anyhow!(
                    "shadow directory must differ from the monitored directory ({})",
                    monitor.display()
                ));
            }
        }
        self.file_pattern()?;
        Ok(())
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
