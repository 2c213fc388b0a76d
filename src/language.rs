use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Languages the atelier composes in. Doubles as the `rust-i18n` locale
/// selector and as the language hint passed to the text model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    It,
    En,
    De,
}

impl Language {
    /// Two-letter locale code, matching the `locales/` table names.
    pub fn code(self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
            Language::De => "de",
        }
    }

    /// Full language name, used when instructing the text model.
    pub fn name(self) -> &'static str {
        match self {
            Language::It => "Italian",
            Language::En => "English",
            Language::De => "German",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::It
    }
}
