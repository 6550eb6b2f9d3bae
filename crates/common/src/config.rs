use anyhow::Result;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub data: Data,
    pub moralis: Moralis,
    pub narrative: Narrative,
    pub report: Report,
    pub web: Option<Web>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Data {
    /// Directory holding the five CSV tables.
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Moralis {
    pub api_url: String,
    pub chain: String,
    /// Name of the environment variable that carries the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Moralis {
    /// The key is optional: without it every remote fetch fails cleanly.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeBackend {
    Template,
    Chat,
}

impl NarrativeBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Narrative {
    pub backend: NarrativeBackend,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub max_tokens_detailed: u32,
    pub max_tokens_brief: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Narrative {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub output_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let content = std::fs::read_to_string("config/default.toml")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.data.dir, "web3_kgenX_new");
        assert_eq!(config.moralis.chain, "eth");
        assert_eq!(config.narrative.backend, NarrativeBackend::Template);
        assert_eq!(config.narrative.max_tokens_detailed, 800);
        assert_eq!(config.narrative.max_tokens_brief, 300);
    }

    #[test]
    fn test_web_config_section() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        let web = config.web.expect("web section should be present");
        assert_eq!(web.port, 5000);
        assert_eq!(web.host, "0.0.0.0");
    }

    #[test]
    fn test_web_config_optional() {
        // Config without [web] section should still parse
        let toml = r#"
[general]
log_level = "debug"

[data]
dir = "data"

[moralis]
api_url = "https://deep-index.moralis.io/api/v2.2"
chain = "eth"
api_key_env = "MORALIS_API_KEY"
timeout_secs = 5

[narrative]
backend = "chat"
endpoint = "http://localhost:8000/v1"
model = "test-model"
api_key_env = "NARRATIVE_API_KEY"
max_tokens_detailed = 800
max_tokens_brief = 300
temperature = 0.7
top_p = 0.9

[report]
output_dir = "out"
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert!(config.web.is_none());
        assert_eq!(config.narrative.backend, NarrativeBackend::Chat);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let toml = include_str!("../../../config/default.toml")
            .replace("backend = \"template\"", "backend = \"oracle\"");
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_missing_api_key_env_is_none() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        let moralis = Moralis {
            api_key_env: "PERSONA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..config.moralis
        };
        assert!(moralis.api_key().is_none());
    }
}
