use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use crate::error::{Result, SubtransError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inference: InferenceConfig,
    pub job: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the chat-completion server (e.g., a local ollama)
    pub endpoint: String,
    /// Sampling temperature; kept near zero so reruns stay close
    pub temperature: f32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Neighbouring lines sent on each side of the current one (0 disables context)
    pub context_lines: usize,
    /// Replaces the built-in system instruction when set
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Source language label, or "auto"
    pub source_language: String,
    /// Target language label or code
    pub target_language: TargetLanguage,
    /// Model name passed through to the endpoint
    pub model: String,
    /// Items dispatched concurrently per batch
    pub concurrency: usize,
    /// Cap on in-flight requests across all files (0 = no cap)
    pub max_in_flight: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            context_lines: 5,
            system_prompt: None,
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            source_language: "Japanese".to_string(),
            target_language: TargetLanguage::TraditionalChinese,
            model: "huihui_ai/aya-expanse-abliterated:latest".to_string(),
            concurrency: 6,
            max_in_flight: 0,
        }
    }
}

/// Target languages with a known output-file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetLanguage {
    TraditionalChinese,
    English,
    Japanese,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 3] = [
        TargetLanguage::TraditionalChinese,
        TargetLanguage::English,
        TargetLanguage::Japanese,
    ];

    /// Resolve a code, English name or native label
    pub fn from_label(label: &str) -> Result<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| {
                lang.code() == wanted
                    || lang.english_name().to_lowercase() == wanted
                    || lang.native_label() == wanted
            })
            .ok_or_else(|| {
                SubtransError::Config(format!(
                    "Unknown target language '{}'. Valid values: {}",
                    label,
                    Self::ALL.iter().map(|l| l.code()).collect::<Vec<_>>().join(", ")
                ))
            })
    }

    /// Suffix inserted before the file extension
    pub fn code(&self) -> &'static str {
        match self {
            Self::TraditionalChinese => "zh_tw",
            Self::English => "en",
            Self::Japanese => "jp",
        }
    }

    /// Name used inside the prompt
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::TraditionalChinese => "Traditional Chinese",
            Self::English => "English",
            Self::Japanese => "Japanese",
        }
    }

    pub fn native_label(&self) -> &'static str {
        match self {
            Self::TraditionalChinese => "繁體中文",
            Self::English => "英文",
            Self::Japanese => "日文",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.english_name())
    }
}

impl TryFrom<String> for TargetLanguage {
    type Error = SubtransError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_label(&value)
    }
}

impl From<TargetLanguage> for String {
    fn from(lang: TargetLanguage) -> Self {
        lang.code().to_string()
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.inference.endpoint.trim().is_empty() {
            return Err(SubtransError::Config("inference.endpoint must not be empty".to_string()));
        }
        if !self.inference.temperature.is_finite() || self.inference.temperature < 0.0 {
            return Err(SubtransError::Config(format!(
                "inference.temperature must be a non-negative number, got {}",
                self.inference.temperature
            )));
        }
        if self.inference.timeout_secs == 0 {
            return Err(SubtransError::Config("inference.timeout_secs must be at least 1".to_string()));
        }
        if self.job.concurrency == 0 {
            return Err(SubtransError::Config("job.concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_language_labels() {
        assert_eq!(TargetLanguage::from_label("zh_tw").unwrap(), TargetLanguage::TraditionalChinese);
        assert_eq!(TargetLanguage::from_label("繁體中文").unwrap(), TargetLanguage::TraditionalChinese);
        assert_eq!(TargetLanguage::from_label(" english ").unwrap(), TargetLanguage::English);
        assert_eq!(TargetLanguage::from_label("日文").unwrap(), TargetLanguage::Japanese);
        assert_eq!(TargetLanguage::Japanese.code(), "jp");
    }

    #[test]
    fn test_unknown_target_language_is_config_error() {
        let err = TargetLanguage::from_label("klingon").unwrap_err();
        assert!(matches!(err, SubtransError::Config(_)));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            "[job]\ntarget_language = \"en\"\nconcurrency = 3\n",
        )
        .unwrap();
        assert_eq!(config.job.target_language, TargetLanguage::English);
        assert_eq!(config.job.concurrency, 3);
        assert_eq!(config.inference.context_lines, 5);
        assert_eq!(config.inference.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_invalid_target_language_in_file() {
        let parsed: std::result::Result<Config, _> = toml::from_str("[job]\ntarget_language = \"xx\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.job.concurrency = 0;
        assert!(matches!(config.validate(), Err(SubtransError::Config(_))));
    }

    #[test]
    fn test_load_errors_keep_their_kind() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::from_file(dir.path().join("absent.toml")),
            Err(SubtransError::Io(_))
        ));

        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[job\nconcurrency = 3\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SubtransError::Toml(_))));

        std::fs::write(&path, "[job]\nconcurrency = 0\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SubtransError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtrans.toml");

        let mut config = Config::default();
        config.job.target_language = TargetLanguage::Japanese;
        config.job.max_in_flight = 4;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.job.target_language, TargetLanguage::Japanese);
        assert_eq!(loaded.job.max_in_flight, 4);
    }
}
