// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use backtrail_app::{DEFAULT_ACCENT, QuickRange, Theme};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "warn";
const LOG_FILE_NAME: &str = "backtrail.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            history: History::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub theme: Option<String>,
    pub accent: Option<String>,
    pub default_range: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            theme: Some(Theme::Light.as_str().to_owned()),
            accent: Some(DEFAULT_ACCENT.to_owned()),
            default_range: Some(QuickRange::All.as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct History {
    pub clear_default_range: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("BACKTRAIL_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set BACKTRAIL_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(backtrail_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and keep values under [storage], [ui], [history], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            backtrail_db::validate_db_path(db_path)?;
        }

        if let Some(theme) = &self.ui.theme
            && Theme::parse(theme).is_none()
        {
            bail!(
                "ui.theme in {} must be \"light\" or \"dark\", got {theme:?}",
                path.display()
            );
        }

        if let Some(accent) = &self.ui.accent
            && !is_hex_color(accent)
        {
            bail!(
                "ui.accent in {} must be a #rrggbb color, got {accent:?}",
                path.display()
            );
        }

        for (key, value) in [
            ("ui.default_range", &self.ui.default_range),
            ("history.clear_default_range", &self.history.clear_default_range),
        ] {
            if let Some(value) = value
                && QuickRange::parse(value).is_none()
            {
                bail!(
                    "{key} in {} must be one of {}, got {value:?}",
                    path.display(),
                    quick_range_names()
                );
            }
        }

        if let Some(level) = &self.log.level
            && LevelFilter::from_str(level).is_err()
        {
            bail!(
                "log.level in {} must be one of off, error, warn, info, debug, trace; got {level:?}",
                path.display()
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => backtrail_db::default_db_path(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.ui
            .theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default()
    }

    pub fn accent(&self) -> &str {
        self.ui.accent.as_deref().unwrap_or(DEFAULT_ACCENT)
    }

    pub fn default_range(&self) -> QuickRange {
        self.ui
            .default_range
            .as_deref()
            .and_then(QuickRange::parse)
            .unwrap_or_default()
    }

    /// Preselected range in the clear dialog; `all` unless configured.
    pub fn clear_default_range(&self) -> QuickRange {
        self.history
            .clear_default_range
            .as_deref()
            .and_then(QuickRange::parse)
            .unwrap_or(QuickRange::All)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.file {
            return Ok(PathBuf::from(path));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set [log].file to a writable path")
        })?;
        Ok(cache_root.join(backtrail_db::APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# backtrail config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/backtrail/history.db)\n# db_path = \"/absolute/path/to/history.db\"\n\n[ui]\ntheme = \"light\"\naccent = \"{}\"\n# One of: {}\ndefault_range = \"all\"\n\n[history]\n# Preselected time range in the clear dialog (`C`).\nclear_default_range = \"all\"\n\n[log]\nlevel = \"{}\"\n# file = \"/absolute/path/to/backtrail.log\"\n",
            path.display(),
            DEFAULT_ACCENT,
            quick_range_names(),
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|ch| ch.is_ascii_hexdigit()))
}

pub(crate) fn quick_range_names() -> String {
    QuickRange::ALL
        .iter()
        .map(|range| range.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{Config, is_hex_color};
    use anyhow::Result;
    use backtrail_app::{QuickRange, Theme};
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.theme(), Theme::Light);
        assert_eq!(config.accent(), "#2196f3");
        assert_eq!(config.default_range(), QuickRange::All);
        assert_eq!(config.clear_default_range(), QuickRange::All);
        assert_eq!(config.log_level(), "warn");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[ui]\ntheme = \"dark\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[storage], [ui], [history], and [log]"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[storage]\ndb_path = \"/tmp/history.db\"\n[ui]\ntheme = \"dark\"\naccent = \"#ff8800\"\ndefault_range = \"last-week\"\n[history]\nclear_default_range = \"today\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/backtrail.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.db_path()?, PathBuf::from("/tmp/history.db"));
        assert_eq!(config.theme(), Theme::Dark);
        assert_eq!(config.accent(), "#ff8800");
        assert_eq!(config.default_range(), QuickRange::LastWeek);
        assert_eq!(config.clear_default_range(), QuickRange::Today);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/backtrail.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn invalid_theme_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\ntheme = \"sepia\"\n")?;
        let error = Config::load(&path).expect_err("unknown theme should fail");
        assert!(error.to_string().contains("ui.theme"));
        Ok(())
    }

    #[test]
    fn invalid_accent_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\naccent = \"blue\"\n")?;
        let error = Config::load(&path).expect_err("non-hex accent should fail");
        assert!(error.to_string().contains("#rrggbb"));
        Ok(())
    }

    #[test]
    fn invalid_ranges_are_rejected() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[history]\nclear_default_range = \"Last week\"\n")?;
        let error = Config::load(&path).expect_err("label instead of name should fail");
        let message = error.to_string();
        assert!(message.contains("history.clear_default_range"));
        assert!(message.contains("last-week"));

        let (_temp, path) = write_config("version = 1\n[ui]\ndefault_range = \"forever\"\n")?;
        let error = Config::load(&path).expect_err("unknown range should fail");
        assert!(error.to_string().contains("ui.default_range"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"loud\"\n")?;
        let error = Config::load(&path).expect_err("unknown level should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("BACKTRAIL_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("BACKTRAIL_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn db_path_prefers_storage_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[storage]\ndb_path = \"/explicit/from-config.db\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("BACKTRAIL_DB_PATH", "/from/env.db");
        }
        let config = Config::load(&path)?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("BACKTRAIL_DB_PATH");
        }
        assert_eq!(config.db_path()?, PathBuf::from("/explicit/from-config.db"));
        Ok(())
    }

    #[test]
    fn db_path_uses_env_override_when_storage_db_path_missing() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("BACKTRAIL_DB_PATH", "/from/env-only.db");
        }
        let config = Config::load(&path)?;
        let resolved = config.db_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("BACKTRAIL_DB_PATH");
        }
        assert_eq!(resolved, PathBuf::from("/from/env-only.db"));
        Ok(())
    }

    #[test]
    fn db_path_rejects_uri_style_storage_value() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[storage]\ndb_path = \"file:history.db?mode=ro\"\n")?;
        let error = Config::load(&path).expect_err("URI db_path should fail validation");
        assert!(error.to_string().contains("file: URI"));
        Ok(())
    }

    #[test]
    fn log_file_defaults_under_cache_dir() -> Result<()> {
        let config = Config::default();
        let path = config.log_file()?;
        assert!(path.ends_with("backtrail/backtrail.log"), "got {}", path.display());
        Ok(())
    }

    #[test]
    fn hex_color_check() {
        assert!(is_hex_color("#2196f3"));
        assert!(is_hex_color("#F44336"));
        assert!(!is_hex_color("2196f3"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("#zzzzzz"));
    }

    #[test]
    fn example_config_round_trips_through_loader() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        for section in ["[storage]", "[ui]", "[history]", "[log]"] {
            assert!(example.contains(section), "missing {section}");
        }

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.theme(), Theme::Light);
        assert_eq!(config.clear_default_range(), QuickRange::All);
        Ok(())
    }
}
