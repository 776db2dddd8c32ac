use image::GrayImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{OcrOptions, PipelineSettings};
use crate::detection::confidence::{CharacterRatioScorer, ConfidenceScorer};
use crate::detection::contours::RegionFilter;
use crate::detection::diagrams::DiagramDetector;
use crate::detection::ocr::{
    recognize_bounded, EngineMode, LanguageSet, RecognitionParams, SegmentationMode,
    TextRecognizer,
};
use crate::detection::preprocessing::{self, Preprocessed};
use crate::detection::tables::{ContourTableDetector, TableDetector};
use crate::error::{ImageDecodeError, PipelineError};
use crate::models::{RecognitionResult, TableArtifact};

/// Run `f` on a worker thread and wait at most `timeout` for its result.
/// With no timeout `f` runs on the calling thread.
///
/// A worker that overruns is left to finish on its own; its result is dropped.
pub fn run_bounded<T, F>(timeout: Option<Duration>, f: F) -> Result<T, RecvTimeoutError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let Some(limit) = timeout else {
        return Ok(f());
    };

    let (sender, receiver) = mpsc::channel();
    std::thread::spawn(move || {
        // Receiver is gone once the caller timed out
        let _ = sender.send(f());
    });
    receiver.recv_timeout(limit)
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    fn save(&self, name: &str, img: &GrayImage) {
        let path = self.output_dir.join(name);
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create debug directory {}: {}", parent.display(), e);
                return;
            }
        }
        match img.save(&path) {
            Ok(()) => tracing::debug!("Debug: saved {}", name),
            Err(e) => tracing::warn!("Failed to save debug image {}: {}", path.display(), e),
        }
    }

    fn save_stages(&self, pre: &Preprocessed, tables: &[TableArtifact]) {
        self.save("01_grayscale.png", &pre.grayscale);
        self.save("02_binarized.png", &pre.binarized);

        for (idx, table) in tables.iter().enumerate() {
            let b = table.bbox;
            let crop = image::imageops::crop_imm(&pre.binarized, b.x, b.y, b.width, b.height);
            self.save(&format!("03_tables/{:02}.png", idx + 1), &crop.to_image());
        }
    }
}

/// OCR structure-recovery pipeline.
///
/// Each call to [`Pipeline::run`] is independent: preprocess, recognize the
/// full page, then detect tables and diagrams side by side and score the text.
pub struct Pipeline {
    recognizer: Arc<dyn TextRecognizer>,
    settings: PipelineSettings,
    table_detector: Option<Box<dyn TableDetector>>,
    diagram_detector: DiagramDetector,
    scorer: Box<dyn ConfidenceScorer>,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    /// Create a pipeline around `recognizer` with default settings and stages
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            settings: PipelineSettings::default(),
            table_detector: None,
            diagram_detector: DiagramDetector::default(),
            scorer: Box::new(CharacterRatioScorer),
            debug: None,
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the contour-based table detector
    pub fn with_table_detector(mut self, detector: Box<dyn TableDetector>) -> Self {
        self.table_detector = Some(detector);
        self
    }

    pub fn with_diagram_detector(mut self, detector: DiagramDetector) -> Self {
        self.diagram_detector = detector;
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn ConfidenceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug.as_ref().map(|d| d.output_dir.as_path())
    }

    /// Languages for the full-page pass.
    pub fn languages(&self, options: &OcrOptions) -> LanguageSet {
        let primary = &self.settings.default_language;
        if options.multi_language {
            if let Some(set) = LanguageSet::with_extras(primary, &self.settings.extra_languages) {
                return set;
            }
        }
        LanguageSet::single(primary.clone())
    }

    /// Recognizer parameters for the full-page pass.
    pub fn page_params(&self, options: &OcrOptions) -> RecognitionParams {
        RecognitionParams {
            segmentation: SegmentationMode::AutoWithOsd,
            engine: if options.detect_handwriting {
                EngineMode::LstmOnly
            } else {
                EngineMode::Default
            },
            languages: self.languages(options),
            preserve_interword_spaces: options.preserve_formatting,
        }
    }

    /// Recognizer parameters for re-reading a table candidate.
    pub fn region_params(&self) -> RecognitionParams {
        RecognitionParams {
            segmentation: SegmentationMode::Auto,
            engine: EngineMode::Default,
            languages: LanguageSet::single(self.settings.default_language.clone()),
            preserve_interword_spaces: false,
        }
    }

    fn default_table_detector(&self) -> ContourTableDetector {
        ContourTableDetector::new(Arc::clone(&self.recognizer), self.region_params())
            .with_filter(RegionFilter {
                min_area: self.settings.min_table_area,
                min_aspect_ratio: self.settings.min_aspect_ratio,
                max_aspect_ratio: self.settings.max_aspect_ratio,
            })
            .with_timeout(self.settings.timeout())
    }

    fn preprocess(&self, bytes: &[u8]) -> Result<Preprocessed, ImageDecodeError> {
        let timeout = self.settings.timeout();
        if timeout.is_none() {
            return preprocessing::preprocess(bytes);
        }

        let owned = bytes.to_vec();
        match run_bounded(timeout, move || preprocessing::preprocess(&owned)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                Err(ImageDecodeError::TimedOut(timeout.unwrap_or_default()))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ImageDecodeError::Aborted),
        }
    }

    /// Run the whole pipeline on encoded image bytes.
    pub fn run(&self, bytes: &[u8], options: &OcrOptions) -> Result<RecognitionResult, PipelineError> {
        let started = Instant::now();

        let pre = self.preprocess(bytes)?;

        let params = self.page_params(options);
        tracing::debug!(
            recognizer = self.recognizer.name(),
            psm = params.segmentation.psm(),
            oem = params.engine.oem(),
            languages = %params.languages.to_tesseract_arg(),
            "recognizing page"
        );
        let page = recognize_bounded(
            &self.recognizer,
            pre.binarized.clone(),
            params.clone(),
            self.settings.timeout(),
        )?;

        let (tables, diagrams) = std::thread::scope(|s| {
            let tables = s.spawn(|| {
                if !options.detect_tables {
                    return Vec::new();
                }
                match &self.table_detector {
                    Some(detector) => detector.detect(&pre.binarized),
                    None => self.default_table_detector().detect(&pre.binarized),
                }
            });

            let diagrams = if options.detect_diagrams {
                self.diagram_detector.detect(&page.text)
            } else {
                Vec::new()
            };

            let tables = tables
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (tables, diagrams)
        });

        let confidence = self.scorer.score(&page.text);

        if let Some(debug) = &self.debug {
            debug.save_stages(&pre, &tables);
        }

        tracing::info!(
            chars = page.text.chars().count(),
            tables = tables.len(),
            diagrams = diagrams.len(),
            confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline finished"
        );

        Ok(RecognitionResult {
            text: page.text,
            tokens: page.tokens,
            tables,
            diagrams,
            confidence,
            languages: vec![params.languages.primary().to_string()],
            page_count: 1,
        })
    }
}
