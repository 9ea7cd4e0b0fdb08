// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Overrides `[log].level` with a full `env_logger` filter string.
pub const LOG_ENV: &str = "BACKTRAIL_LOG";

/// Sends log records to the configured file; the terminal belongs to the UI.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_file()?;
    let builder = builder_for(config, &path)?;
    install(builder)?;
    log::info!("logging to {}", path.display());
    Ok(path)
}

fn builder_for(config: &Config, path: &Path) -> Result<Builder> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {}; set [log].file to a writable path",
                path.display()
            )
        })?;

    let mut builder = Builder::from_env(Env::new().filter_or(LOG_ENV, config.log_level()));
    builder
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs();
    Ok(builder)
}

fn install(mut builder: Builder) -> Result<()> {
    builder.try_init().context("install logger")
}

#[cfg(test)]
mod tests {
    use super::builder_for;
    use crate::config::Config;
    use anyhow::Result;

    #[test]
    fn builder_creates_missing_log_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("backtrail.log");

        let _builder = builder_for(&Config::default(), &path)?;
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn builder_reports_unwritable_log_path() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "")?;

        let error = builder_for(&Config::default(), &blocker.join("backtrail.log"))
            .err()
            .ok_or_else(|| anyhow::anyhow!("log path under a file should fail"))?;
        assert!(error.to_string().contains("create log directory"));
        Ok(())
    }
}
