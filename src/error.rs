use std::time::Duration;

/// The input bytes could not be turned into pixels.
#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("Empty image buffer")]
    Empty,

    #[error("Unsupported or corrupt image: {0}")]
    Unsupported(#[from] image::ImageError),

    #[error("Image decode timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Image decode aborted")]
    Aborted,
}

/// The text recognizer failed to produce a result.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("Recognizer not available: {0}")]
    EngineUnavailable(String),

    #[error("Recognition failed: {0}")]
    EngineFailed(String),

    #[error("Recognition timed out after {0:?}")]
    TimedOut(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal failure of a whole pipeline run. No partial result accompanies it.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] ImageDecodeError),

    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Option {key} expects true or false, got {value:?}")]
    InvalidBool { key: String, value: String },

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}
