//! Loading `ExplorerConfig` for the CLI.

use anyhow::Context;
use dbw_sync::ExplorerConfig;
use std::path::Path;

/// Read the config file if given, then apply the `--url` override.
pub fn load_config(path: Option<&Path>, url: Option<&str>) -> anyhow::Result<ExplorerConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ExplorerConfig::from_json(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ExplorerConfig::default(),
    };
    if let Some(url) = url {
        config.base_url = url.to_string();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_overrides_file() {
        let path = std::env::temp_dir().join("dbw-cmd-config-test.json");
        std::fs::write(&path, r#"{"base_url": "http://file:1", "data_limit": 5}"#).unwrap();
        let config = load_config(Some(&path), Some("http://flag:2")).unwrap();
        assert_eq!(config.base_url, "http://flag:2");
        assert_eq!(config.data_limit, Some(5));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/dbw.json")), None).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config"));
    }
}
