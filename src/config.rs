use crate::ConfigError;
use crate::language::Language;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Commission inbox of the atelier. Fixed destination for every mail handoff.
pub const DEFAULT_ATELIER_ADDRESS: &str = "giu.bas.91@gmail.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    pub api_key: Option<String>,

    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default)]
    pub language: Language,

    #[serde(default = "default_atelier_address")]
    pub atelier_address: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Delay before the recurring-plan offer appears after a composition.
    #[serde(default = "default_recurring_offer_delay_ms")]
    pub recurring_offer_delay_ms: u64,

    /// How long the copy acknowledgment stays visible.
    #[serde(default = "default_copy_ack_reset_ms")]
    pub copy_ack_reset_ms: u64,
}

fn default_text_model() -> String {
    "gemini-3-flash-preview".into()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".into()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".into()
}

fn default_voice() -> String {
    "Kore".into()
}

fn default_atelier_address() -> String {
    DEFAULT_ATELIER_ADDRESS.into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_recurring_offer_delay_ms() -> u64 {
    800
}

fn default_copy_ack_reset_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: None,
            text_model: default_text_model(),
            image_model: default_image_model(),
            tts_model: default_tts_model(),
            voice: default_voice(),
            language: Language::default(),
            atelier_address: default_atelier_address(),
            temperature: default_temperature(),
            recurring_offer_delay_ms: default_recurring_offer_delay_ms(),
            copy_ack_reset_ms: default_copy_ack_reset_ms(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> crate::Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not determine home directory".into()))?;
        let omaggio_dir = home.join(".omaggio");
        let config_path = omaggio_dir.join("config.toml");

        if !omaggio_dir.exists() {
            fs::create_dir_all(&omaggio_dir).map_err(ConfigError::Io)?;
        }

        if config_path.exists() {
            Ok(Self::load_from(&config_path)?)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config =
            toml::from_str(&contents).map_err(|err| ConfigError::Load(err.to_string()))?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|err| ConfigError::Save(err.to_string()))?;
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.atelier_address.trim().is_empty() {
            return Err(ConfigError::Validation("atelier_address is empty".into()));
        }
        Ok(())
    }
}
