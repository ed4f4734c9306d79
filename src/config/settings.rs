use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub providers: Vec<ProviderConfig>,
    pub provider: ProviderSettings,
    pub session: SessionSettings,
    pub context: ContextSettings,
    pub logging: LoggingConfig,
}

/// One Data Provider entry. A `url` selects the HTTP transport, otherwise
/// `command` + `args` are spawned as a long-lived process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ProviderConfig {
    pub fn process(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            env: HashMap::new(),
            url: None,
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_ms: u64,
    pub user_provider: String,
    pub order_provider: String,
    pub channel_buffer_size: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            user_provider: "user_profile_server".to_string(),
            order_provider: "order_management_server".to_string(),
            channel_buffer_size: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub backend: StorageBackend,
    pub cache_dir: PathBuf,
    pub sqlite_path: PathBuf,
    pub max_history: usize,
    pub load_history: usize,
    pub retention_days: i64,
    pub cleanup_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            cache_dir: PathBuf::from("user_cache"),
            sqlite_path: PathBuf::from("user_cache/sessions.db"),
            max_history: 50,
            load_history: 20,
            retention_days: 30,
            cleanup_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Vi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    pub language: Language,
    pub currency: String,
    pub delivery_days_ahead: u32,
    pub recent_limit: u32,
    pub max_topics: usize,
    pub max_interactions: usize,
    pub snippet_chars: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            language: Language::En,
            currency: "VND".to_string(),
            delivery_days_ahead: 7,
            recent_limit: 5,
            max_topics: 5,
            max_interactions: 3,
            snippet_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderFile {
    #[serde(default)]
    mcp_servers: Vec<ProviderConfig>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Load settings and append providers declared in `mcp_config.json` and
    /// the `MCP_SERVERS` environment variable. Malformed extra sources are
    /// skipped and described in the returned list, so the caller can report
    /// them once logging is up.
    pub fn load() -> Result<(Self, Vec<String>)> {
        let mut settings = Self::new().context("Failed to load settings")?;

        let config_path =
            env::var("MCP_CONFIG_PATH").unwrap_or_else(|_| "mcp_config.json".to_string());
        let servers = env::var("MCP_SERVERS").ok();
        let skipped = settings.add_provider_sources(Path::new(&config_path), servers.as_deref());

        Ok((settings, skipped))
    }

    /// Append providers from a provider file and an inline JSON array.
    /// Returns one message per source that could not be used.
    pub fn add_provider_sources(&mut self, path: &Path, servers: Option<&str>) -> Vec<String> {
        let mut skipped = Vec::new();

        match providers_from_file(path) {
            Ok(extra) => self.providers.extend(extra),
            Err(e) => skipped.push(format!("Ignoring provider file {}: {:#}", path.display(), e)),
        }

        if let Some(raw) = servers {
            match providers_from_json(raw) {
                Ok(extra) => self.providers.extend(extra),
                Err(e) => skipped.push(format!("Ignoring MCP_SERVERS: {:#}", e)),
            }
        }

        skipped
    }
}

pub fn providers_from_file(path: &Path) -> Result<Vec<ProviderConfig>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read provider file {:?}", path))?;
    let parsed: ProviderFile =
        serde_json::from_str(&raw).context("Failed to parse provider file")?;
    Ok(parsed.mcp_servers)
}

pub fn providers_from_json(raw: &str) -> Result<Vec<ProviderConfig>> {
    serde_json::from_str(raw).context("Expected a JSON array of provider configs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.session.max_history, 50);
        assert_eq!(settings.session.load_history, 20);
        assert_eq!(settings.session.retention_days, 30);
        assert_eq!(settings.provider.order_provider, "order_management_server");
        assert_eq!(settings.context.language, Language::En);
    }

    #[test]
    fn test_providers_from_json() {
        let raw = r#"[
            {"name": "user_profile_server", "command": "python", "args": ["mcp_user_server.py"]},
            {"name": "orders", "url": "http://localhost:9000"}
        ]"#;
        let providers = providers_from_json(raw).unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].args, vec!["mcp_user_server.py"]);
        assert!(providers[0].url.is_none());
        assert_eq!(providers[1].url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_providers_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp_config.json");
        std::fs::write(
            &path,
            r#"{"mcp_servers": [{"name": "demo", "command": "ragbridge", "args": ["serve-demo"]}]}"#,
        )
        .unwrap();

        let providers = providers_from_file(&path).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "demo");

        let missing = providers_from_file(&dir.path().join("nope.json")).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_add_provider_sources_reports_malformed_sources() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp_config.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut settings = Settings::default();
        let before = settings.providers.len();
        let skipped = settings.add_provider_sources(&path, Some("[{\"name\": "));

        assert_eq!(skipped.len(), 2);
        assert!(skipped[0].starts_with("Ignoring provider file"));
        assert!(skipped[1].starts_with("Ignoring MCP_SERVERS"));
        assert_eq!(settings.providers.len(), before);
    }

    #[test]
    fn test_add_provider_sources_appends_both() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp_config.json");
        std::fs::write(&path, r#"{"mcp_servers": [{"name": "from_file", "command": "ragbridge"}]}"#).unwrap();

        let mut settings = Settings::default();
        let skipped = settings.add_provider_sources(&path, Some(r#"[{"name": "from_env", "url": "http://localhost:9000"}]"#));

        assert!(skipped.is_empty());
        let names: Vec<&str> = settings.providers.iter().map(|p| p.name.as_str()).collect();
        assert!(names.ends_with(&["from_file", "from_env"]));
    }
}
