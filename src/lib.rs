pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use config::{OcrOptions, PipelineSettings};
pub use error::{ConfigError, ImageDecodeError, PipelineError, RecognizerError};
pub use models::{
    BoundingBox, DiagramArtifact, DiagramKind, RecognitionResult, RecognitionToken, Region,
    TableArtifact,
};
pub use pipeline::{DebugConfig, Pipeline};
