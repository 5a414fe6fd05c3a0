use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("NIMBUS_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[indexer]
backend = "jackett"
url = "http://localhost:9117"
api_key = "key"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_missing_indexer() {
        let toml = r#"
[server]
port = 8080
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[cache]
ttl_secs = 600

[indexer]
backend = "prowlarr"
url = "http://localhost:9696"
api_key = "key"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.cache.ttl_secs, 600);
    }

    #[test]
    fn test_optional_sections() {
        let base = r#"
[indexer]
backend = "jackett"
url = "http://localhost:9117"
api_key = "key"
"#;
        let config = load_config_from_str(base).unwrap();
        assert!(config.zilean.is_none());
        assert!(config.debrid.proxy_url.is_none());
        assert_eq!(config.debrid.availability_batch_size, 50);

        let with_extras = format!(
            "{}\n[zilean]\nurl = \"http://localhost:8181\"\n\n[debrid]\nproxy_url = \"http://proxy:8080\"\n",
            base
        );
        let config = load_config_from_str(&with_extras).unwrap();
        assert_eq!(config.zilean.unwrap().url, "http://localhost:8181");
        assert_eq!(config.debrid.proxy_url.as_deref(), Some("http://proxy:8080"));
        assert_eq!(config.indexer.backend, crate::config::IndexerBackendKind::Jackett);
    }
}
