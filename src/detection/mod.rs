pub mod preprocessing;
pub mod contours;
pub mod ocr;
pub mod tables;
pub mod diagrams;
pub mod confidence;

pub use confidence::{CharacterRatioScorer, ConfidenceScorer};
pub use diagrams::{
    CapitalizedWordExtractor, DiagramDetector, DiagramSynthesizer, EntityExtractor, EntityQuery,
    MermaidSynthesizer, PatternTable,
};
pub use ocr::{
    EngineMode, LanguageSet, OcrsRecognizer, Recognition, RecognitionParams, SegmentationMode,
    TesseractRecognizer, TextRecognizer,
};
pub use tables::{ContourTableDetector, TableDetector};
