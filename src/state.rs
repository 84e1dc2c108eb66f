//! Config directory layout and settings loading.
//!
//! Everything the tool persists lives in one directory:
//! `--config-dir`, else `$WEEKLY_REPORT_HOME`, else `~/.weekly-report`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::types::Settings;

/// Environment variable that overrides the default config directory.
pub const HOME_ENV: &str = "WEEKLY_REPORT_HOME";

/// Resolved locations of every persisted file.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    root: PathBuf,
}

impl ConfigPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the config directory from an explicit override, the environment, or `$HOME`.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self, ReportError> {
        if let Some(dir) = override_dir {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().ok_or_else(|| {
            ReportError::ConfigurationError("Could not find home directory".to_string())
        })?;
        Ok(Self::new(home.join(".weekly-report")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn active_deals(&self) -> PathBuf {
        self.root.join("active_deals.json")
    }

    pub fn partners(&self) -> PathBuf {
        self.root.join("partners.json")
    }

    pub fn google_token(&self) -> PathBuf {
        self.root.join("token.json")
    }

    /// Resolve a possibly-relative path against the config directory.
    pub fn resolve_relative(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Directory for Markdown reports.
    pub fn reports_dir(&self, settings: &Settings) -> PathBuf {
        match settings.output.markdown_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => self.resolve_relative(dir),
            _ => self.root.join("reports"),
        }
    }
}

/// Load settings.json. A missing file yields defaults; a malformed one is an error.
pub fn load_settings(paths: &ConfigPaths) -> Result<Settings, ReportError> {
    let path = paths.settings();
    if !path.exists() {
        log::info!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&path)?;
    let settings: Settings =
        serde_json::from_str(&content).map_err(|e| ReportError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

    Ok(settings.normalized())
}
