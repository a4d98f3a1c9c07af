//! Stopword languages

use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Language used for stopword filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    Portuguese,
    Spanish,
    French,
    Italian,
    German,
}

impl Language {
    /// Canonical short code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Portuguese => "pt-br",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::Italian => "it",
            Self::German => "de",
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "pt" | "pt-br" | "portuguese" => Ok(Self::Portuguese),
            "es" | "spanish" => Ok(Self::Spanish),
            "fr" | "french" => Ok(Self::French),
            "it" | "italian" => Ok(Self::Italian),
            "de" | "german" => Ok(Self::German),
            other => Err(ConfigError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
