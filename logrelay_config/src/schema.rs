use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Reuse the section types owned by the crates that consume them
use logrelay_conversation::{ContentionMode, Strings};
use logrelay_ingest::IngestOptions;
use logrelay_providers::{RetryPolicy, RoleNames, gemini};

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONFIG_DIR: &str = "logrelay";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_CONTEXT_MESSAGE: &str = "This is your initial context: you are going to help a team that is in the field of software engineering. All following prompts have to take this into account.";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub conversation: ConversationSettings,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub ingest: IngestOptions,
    #[serde(default)]
    pub roles: RoleNames,
    #[serde(default)]
    pub strings: Strings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "ProviderConfig::default_model")]
    pub model: String,
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
    /// Per-request timeout; unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    fn default_model() -> String {
        gemini::DEFAULT_MODEL.to_string()
    }

    fn default_base_url() -> String {
        gemini::DEFAULT_BASE_URL.to_string()
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationSettings {
    #[serde(default = "ConversationSettings::default_context_message")]
    pub context_message: String,
    #[serde(default = "ConversationSettings::default_max_total_length")]
    pub max_total_length: usize,
    #[serde(default)]
    pub contention: ContentionMode,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            context_message: Self::default_context_message(),
            max_total_length: Self::default_max_total_length(),
            contention: ContentionMode::default(),
        }
    }
}

impl ConversationSettings {
    fn default_context_message() -> String {
        DEFAULT_CONTEXT_MESSAGE.to_string()
    }

    const fn default_max_total_length() -> usize {
        30_000
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct RetryConfig {
    #[serde(default = "RetryConfig::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "RetryConfig::default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Self::default_max_retries(),
            initial_delay_ms: Self::default_initial_delay_ms(),
        }
    }
}

impl RetryConfig {
    const fn default_max_retries() -> u32 {
        3
    }

    const fn default_initial_delay_ms() -> u64 {
        2000
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_delay_ms),
        )
    }
}

impl Config {
    /// Load `~/logrelay/config.json`, apply the environment override and validate.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'logrelay init' to create config.",
                config_path.display()
            );
        }

        let mut config = Self::load_from(&config_path)?;
        match std::env::var(API_KEY_ENV) {
            Ok(api_key) if !api_key.is_empty() => {
                tracing::debug!("Using API key from {API_KEY_ENV}");
                config.provider.api_key = api_key;
            }
            _ => {}
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without environment overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.api_key.is_empty() {
            anyhow::bail!("provider.api_key is empty. Set it in the config or via {API_KEY_ENV}");
        }
        if self.conversation.context_message.is_empty() {
            anyhow::bail!("conversation.context_message must not be empty");
        }
        if self.conversation.max_total_length == 0 {
            anyhow::bail!("conversation.max_total_length must be greater than 0");
        }
        if self.strings.no_content_generated.is_empty() {
            anyhow::bail!("strings.no_content_generated must not be empty");
        }
        if self.ingest.batch_size == 0 {
            anyhow::bail!("ingest.batch_size must be greater than 0");
        }
        Ok(())
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR))
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;
        Ok(config_path)
    }
}

pub const CONFIG_TEMPLATE: &str = r#"{
  "provider": {
    "api_key": "your-gemini-api-key-here",
    "model": "gemini-1.5-flash",
    "base_url": "https://generativelanguage.googleapis.com/v1beta"
  },
  "conversation": {
    "context_message": "This is your initial context: you are going to help a team that is in the field of software engineering. All following prompts have to take this into account.",
    "max_total_length": 30000,
    "contention": "queue"
  },
  "retry": {
    "max_retries": 3,
    "initial_delay_ms": 2000
  },
  "ingest": {
    "batch_size": 20000,
    "encoding": "utf-8",
    "max_file_bytes": 10485760
  },
  "roles": {
    "context": "user",
    "requester": "user",
    "responder": "model"
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use logrelay_ingest::TextEncoding;
    use std::io::Write;

    #[test]
    fn template_parses_and_validates() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.conversation.max_total_length, 30_000);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
        assert_eq!(config.ingest.batch_size, 20_000);
        assert_eq!(config.roles, RoleNames::default());
        assert_eq!(config.strings, Strings::default());
    }

    #[test]
    fn only_the_provider_section_is_required() {
        let config: Config =
            serde_json::from_str(r#"{ "provider": { "api_key": "k" } }"#).unwrap();
        assert_eq!(config.provider.model, gemini::DEFAULT_MODEL);
        assert_eq!(config.conversation.context_message, DEFAULT_CONTEXT_MESSAGE);
        assert_eq!(config.conversation.contention, ContentionMode::Queue);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.ingest.encoding, TextEncoding::Utf8);
        assert!(config.provider.timeout().is_none());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "provider": { "api_key": "k", "timeout_secs": 30 },
                "ingest": { "encoding": "utf-16le" },
                "retry": { "initial_delay_ms": 100 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.ingest.encoding, TextEncoding::Utf16Le);
        assert_eq!(config.ingest.batch_size, 20_000);
        assert_eq!(
            config.retry.policy(),
            RetryPolicy::new(3, Duration::from_millis(100))
        );
        assert_eq!(config.provider.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn empty_context_message_fails_validation() {
        let mut config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        config.conversation.context_message.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_fallback_text_fails_validation() {
        let mut config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        config.strings.no_content_generated.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no_content_generated"));
    }

    #[test]
    fn load_from_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG_TEMPLATE.as_bytes()).unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.provider.api_key, "your-gemini-api-key-here");
    }
}
