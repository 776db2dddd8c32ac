//! Request options and engine-wide settings.
//!
//! `OcrOptions` carries the per-request feature flags and is built once at the
//! boundary (form fields, JSON body or CLI flags). `PipelineSettings` holds the
//! values that stay fixed across requests and can be loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Per-request feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrOptions {
    pub detect_tables: bool,
    /// Prefer the LSTM recognizer, which copes better with handwriting
    pub detect_handwriting: bool,
    pub multi_language: bool,
    pub preserve_formatting: bool,
    pub detect_diagrams: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            detect_tables: true,
            detect_handwriting: true,
            multi_language: false,
            preserve_formatting: true,
            detect_diagrams: true,
        }
    }
}

impl OcrOptions {
    pub const KEYS: [&'static str; 5] = [
        "detectTables",
        "detectHandwriting",
        "multiLanguage",
        "preserveFormatting",
        "detectDiagrams",
    ];

    /// Build options from form-style key/value pairs, starting from the defaults.
    /// Keys outside [`OcrOptions::KEYS`] are ignored.
    pub fn from_form_fields<'a, I>(fields: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::parse_fields(fields, false)
    }

    /// Like [`OcrOptions::from_form_fields`] but rejects unknown keys.
    pub fn from_form_fields_strict<'a, I>(fields: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::parse_fields(fields, true)
    }

    fn parse_fields<'a, I>(fields: I, strict: bool) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();

        for (key, value) in fields {
            let slot = match key {
                "detectTables" => &mut options.detect_tables,
                "detectHandwriting" => &mut options.detect_handwriting,
                "multiLanguage" => &mut options.multi_language,
                "preserveFormatting" => &mut options.preserve_formatting,
                "detectDiagrams" => &mut options.detect_diagrams,
                other if strict => return Err(ConfigError::UnknownOption(other.to_string())),
                _ => continue,
            };
            *slot = parse_bool(key, value)?;
        }

        Ok(options)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Settings shared by every pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub default_language: String,
    /// Appended after `default_language` when multi-language recognition is requested
    pub extra_languages: Vec<String>,
    /// Bound for image decode and every recognizer call, 0 disables it
    pub timeout_secs: u64,
    pub max_file_size_mb: u64,
    pub min_table_area: f64,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_language: "eng".to_string(),
            extra_languages: ["fra", "deu", "spa", "ita"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_secs: 60,
            max_file_size_mb: 10,
            min_table_area: 10_000.0,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 5.0,
        }
    }
}

impl PipelineSettings {
    /// Load settings from a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::Invalid("default_language is empty".into()));
        }
        if self.extra_languages.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::Invalid("extra_languages contains an empty entry".into()));
        }
        if !(self.min_table_area > 0.0) {
            return Err(ConfigError::Invalid("min_table_area must be positive".into()));
        }
        if !(self.min_aspect_ratio > 0.0) || self.min_aspect_ratio > self.max_aspect_ratio {
            return Err(ConfigError::Invalid(format!(
                "aspect ratio range [{}, {}] is not valid",
                self.min_aspect_ratio, self.max_aspect_ratio
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}
