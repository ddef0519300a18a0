use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default cacatua data directory: ~/.cacatua
pub fn get_cacatua_data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".cacatua"))
}

/// Load config from an explicit path, then apply environment overrides.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {} failed: {e}", path.display()))?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.cacatua/config.toml (highest)
    let data_dir = get_cacatua_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        let s = std::fs::read_to_string(&home_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    // File logging without an explicit directory goes under the data dir.
    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
fn apply_env_overrides(cfg: &mut AppConfig) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides_from<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("CACATUA_BACKEND_URL") {
        *cfg.backend.base_url_mut() = v;
    }
    if let Some(v) = non_empty("CACATUA_HOST") {
        cfg.http_server.host = v;
    }
    if let Some(v) = non_empty("CACATUA_PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => cfg.http_server.port = port,
            Err(e) => tracing::warn!("ignoring CACATUA_PORT={v}: {e}"),
        }
    }
    if let Some(v) = non_empty("CACATUA_LOG_LEVEL") {
        cfg.logging.level = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn load_from_path_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http_server]\nport = 18080\n\n[logs]\nfold_policy = \"separate\"").unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.http_server.port, 18080);
    }

    #[test]
    fn load_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn env_overrides_replace_non_empty_values() {
        let env: HashMap<&str, &str> = [
            ("CACATUA_BACKEND_URL", "http://podman.local:9000"),
            ("CACATUA_HOST", "0.0.0.0"),
            ("CACATUA_PORT", "not-a-port"),
            ("CACATUA_LOG_LEVEL", "   "),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        apply_overrides_from(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

        let BackendConfig::Podman(podman) = &cfg.backend;
        assert_eq!(podman.base_url, "http://podman.local:9000");
        assert_eq!(cfg.http_server.host, "0.0.0.0");
        assert_eq!(cfg.http_server.port, 8080);
        assert_eq!(cfg.logging.level, "info");
    }
}
