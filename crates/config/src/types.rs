use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Default per-call timeout for provider requests
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
/// Default `max_tokens` when a model entry omits it
pub const DEFAULT_MAX_TOKENS: i64 = 1024;
/// Default `temperature` when a model entry omits it
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
/// Sampling temperature bounds, for model defaults and request overrides alike
pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Provider id -> connection settings
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
    /// Logical model name -> routing entry
    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Logging Configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut modules = HashMap::new();
        modules.insert("api".to_string(), "debug".to_string());
        modules.insert("services".to_string(), "debug".to_string());

        Self {
            level: default_log_level(),
            format: default_log_format(),
            modules,
        }
    }
}

/// Settings for the reverse proxy sitting in front of this service
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Header carrying the tenant id the gateway authenticated
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            tenant_header: default_tenant_header(),
        }
    }
}

fn default_tenant_header() -> String {
    "x-tenant-id".to_string()
}

/// Wire format spoken by an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BackendKind {
    /// OpenAI and everything that copies its API (Azure, Together, Groq, ...)
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    #[serde(rename = "anthropic")]
    Anthropic,
}

/// Connection settings for one provider adapter.
///
/// The API key itself never lives in the file; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub backend: BackendKind,
    pub base_url: String,
    pub api_key_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// OpenAI organization header
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Anthropic API version header
    #[serde(default)]
    pub version: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultParams {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for DefaultParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

fn default_max_tokens() -> i64 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// One entry of the `models` mapping
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub provider: String,
    pub model_name: String,
    #[serde(default)]
    pub default_params: DefaultParams,
    #[serde(default)]
    pub fallback_provider: Option<String>,
    /// Concrete model to request from the fallback provider
    #[serde(default)]
    pub fallback_model_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NamedModel {
    pub name: String,
    pub entry: ModelEntry,
}

/// The `models` mapping in file order.
///
/// Kept as a list rather than a map so repeated keys survive parsing and can
/// be reported by the registry instead of silently overwriting each other.
#[derive(Debug, Clone, Default)]
pub struct ModelsConfig(Vec<NamedModel>);

impl ModelsConfig {
    pub fn new(models: Vec<NamedModel>) -> Self {
        Self(models)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedModel> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First entry with the given name
    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.0.iter().find(|m| m.name == name).map(|m| &m.entry)
    }
}

impl<'de> Deserialize<'de> for ModelsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ModelsVisitor;

        impl<'de> Visitor<'de> for ModelsVisitor {
            type Value = ModelsConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of logical model name to model entry")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(ModelsConfig::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut models = Vec::new();
                while let Some((name, entry)) = map.next_entry::<String, ModelEntry>()? {
                    models.push(NamedModel { name, entry });
                }
                Ok(ModelsConfig(models))
            }
        }

        deserializer.deserialize_map(ModelsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3000);
    }

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "pretty");
        assert_eq!(logging.modules.get("api").unwrap(), "debug");
    }

    #[test]
    fn test_models_preserve_file_order() {
        let yaml = r#"
zeta:
  provider: p
  model_name: z
alpha:
  provider: p
  model_name: a
"#;
        let models: ModelsConfig = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_provider_settings_optional_headers() {
        let yaml = r#"
backend: openai_compatible
base_url: https://api.openai.com/v1
api_key_env: OPENAI_API_KEY
organization_id: org-123
"#;
        let settings: ProviderSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.organization_id.as_deref(), Some("org-123"));
        assert!(settings.version.is_none());
        assert_eq!(settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_provider_settings_missing_base_url() {
        let yaml = r#"
backend: anthropic
api_key_env: ANTHROPIC_API_KEY
"#;
        let result: Result<ProviderSettings, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }
}
