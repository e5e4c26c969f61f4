//! Configuração do pdfassist carregada a partir de `pdfassist.toml`.
//!
//! A struct [`PdfAssistConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `PDFCO_API_KEY` e `GEMINI_API_KEY` têm
//! precedência sobre o arquivo.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::PdfAssistError;
use crate::poller::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, PollConfig};

pub const CONFIG_FILE: &str = "pdfassist.toml";
pub const PDFCO_KEY_VAR: &str = "PDFCO_API_KEY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Configuração de nível superior carregada de `pdfassist.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfAssistConfig {
    /// Chave da API PDF.co.
    #[serde(default)]
    pub pdfco_api_key: String,

    /// URL base da API PDF.co.
    #[serde(default = "default_pdfco_base_url")]
    pub pdfco_base_url: String,

    /// Chave da API Gemini.
    #[serde(default)]
    pub gemini_api_key: String,

    /// URL base da API Gemini.
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Intervalo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Máximo de consultas de status antes de declarar timeout.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Modelo usado para perguntas sobre documentos e resumos estruturados.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Modelo rápido usado para detecção de ferramenta e resumos curtos.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Modelo de síntese de fala.
    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// Voz pré-definida usada na síntese de fala.
    #[serde(default = "default_speech_voice")]
    pub speech_voice: String,
}

fn default_pdfco_base_url() -> String {
    crate::pdfco::client::API_URL.to_string()
}

fn default_gemini_base_url() -> String {
    crate::gemini::client::API_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_poll_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_chat_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_fast_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_speech_voice() -> String {
    "Kore".to_string()
}

impl Default for PdfAssistConfig {
    fn default() -> Self {
        Self {
            pdfco_api_key: String::new(),
            pdfco_base_url: default_pdfco_base_url(),
            gemini_api_key: String::new(),
            gemini_base_url: default_gemini_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            chat_model: default_chat_model(),
            fast_model: default_fast_model(),
            speech_model: default_speech_model(),
            speech_voice: default_speech_voice(),
        }
    }
}

impl PdfAssistConfig {
    /// Carrega a configuração de `pdfassist.toml` no diretório atual.
    pub fn load() -> Result<Self, PdfAssistError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração do caminho dado.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self, PdfAssistError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<PdfAssistConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo para as chaves.
        config.apply_env_key(PDFCO_KEY_VAR, std::env::var(PDFCO_KEY_VAR).ok());
        config.apply_env_key(GEMINI_KEY_VAR, std::env::var(GEMINI_KEY_VAR).ok());

        config.validate()?;
        Ok(config)
    }

    fn apply_env_key(&mut self, var: &str, value: Option<String>) {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return;
        };
        match var {
            PDFCO_KEY_VAR => self.pdfco_api_key = value,
            GEMINI_KEY_VAR => self.gemini_api_key = value,
            _ => {}
        }
    }

    fn validate(&self) -> Result<(), PdfAssistError> {
        if self.poll_interval_ms == 0 {
            return Err(PdfAssistError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }

    pub fn require_pdfco_key(&self) -> Result<&str, PdfAssistError> {
        if self.pdfco_api_key.is_empty() {
            return Err(PdfAssistError::MissingApiKey(PDFCO_KEY_VAR));
        }
        Ok(&self.pdfco_api_key)
    }

    pub fn require_gemini_key(&self) -> Result<&str, PdfAssistError> {
        if self.gemini_api_key.is_empty() {
            return Err(PdfAssistError::MissingApiKey(GEMINI_KEY_VAR));
        }
        Ok(&self.gemini_api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = PdfAssistConfig::default();
        assert_eq!(config.pdfco_base_url, "https://api.pdf.co/v1");
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.max_poll_attempts, 20);
        assert_eq!(config.speech_voice, "Kore");
        assert!(config.pdfco_api_key.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            pdfco_api_key = "pk-test-123"
            max_poll_attempts = 5
        "#;
        let config: PdfAssistConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pdfco_api_key, "pk-test-123");
        assert_eq!(config.max_poll_attempts, 5);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.chat_model, "gemini-2.5-pro");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "poll_interval_ms = 250\nfast_model = \"gemini-x\"\n").unwrap();

        let config = PdfAssistConfig::load_from(&path).unwrap();
        assert_eq!(config.poll_config().interval, Duration::from_millis(250));
        assert_eq!(config.poll_config().max_attempts, 20);
        assert_eq!(config.fast_model, "gemini-x");
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PdfAssistConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.max_poll_attempts, 20);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "poll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            PdfAssistConfig::load_from(&path),
            Err(PdfAssistError::Config(_))
        ));
    }

    #[test]
    fn env_key_overrides_file_but_empty_does_not() {
        let mut config = PdfAssistConfig {
            pdfco_api_key: "from-file".into(),
            ..Default::default()
        };
        config.apply_env_key(PDFCO_KEY_VAR, Some(String::new()));
        assert_eq!(config.pdfco_api_key, "from-file");
        config.apply_env_key(PDFCO_KEY_VAR, Some("from-env".into()));
        assert_eq!(config.pdfco_api_key, "from-env");
    }

    #[test]
    fn missing_keys_are_reported() {
        let config = PdfAssistConfig::default();
        assert!(matches!(
            config.require_pdfco_key(),
            Err(PdfAssistError::MissingApiKey(PDFCO_KEY_VAR))
        ));
        assert!(matches!(
            config.require_gemini_key(),
            Err(PdfAssistError::MissingApiKey(GEMINI_KEY_VAR))
        ));
    }
}
