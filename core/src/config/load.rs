use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default taskline data directory: ~/.taskline
pub fn get_taskline_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".taskline"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.taskline/config.toml (highest)
    let data_dir = get_taskline_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./taskline.toml (current directory)
    let local_config = Path::new("taskline.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    // Log under the data directory if not set
    if cfg
        .logging
        .directory
        .as_ref()
        .map_or(true, |s| s.trim().is_empty())
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
pub fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(v) = env_value("TASKLINE_CONCURRENT") {
        cfg.runner.concurrent = v.parse()?;
    }
    if let Some(v) = env_value("TASKLINE_RENDERER") {
        cfg.runner.renderer = v;
    }
    if let Some(v) = env_value("TASKLINE_EXIT_ON_ERROR") {
        let flag = match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => anyhow::bail!("invalid TASKLINE_EXIT_ON_ERROR value: {other}"),
        };
        cfg.runner.exit_on_error = Some(flag);
    }
    Ok(())
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
