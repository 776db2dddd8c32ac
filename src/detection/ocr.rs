//! Text recognizer boundary.
//!
//! The pipeline only talks to [`TextRecognizer`]. Two backends are provided:
//! [`TesseractRecognizer`] drives the `tesseract` command-line tool and honours
//! every recognition parameter, [`OcrsRecognizer`] runs the pure-Rust ocrs
//! engine and ignores the parameters it has no equivalent for.

use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::RecognizerError;
use crate::models::{BoundingBox, RecognitionToken};
use crate::pipeline::run_bounded;

/// How the recognizer should detect page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    /// Automatic page segmentation with orientation and script detection
    AutoWithOsd,
    /// Fully automatic page segmentation, no orientation detection
    Auto,
    /// Treat the image as a single uniform block of text
    SingleBlock,
}

impl SegmentationMode {
    pub fn psm(&self) -> u8 {
        match self {
            SegmentationMode::AutoWithOsd => 1,
            SegmentationMode::Auto => 3,
            SegmentationMode::SingleBlock => 6,
        }
    }
}

/// Which internal recognition algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Whatever the engine has available
    Default,
    /// Neural (LSTM) recognizer only
    LstmOnly,
}

impl EngineMode {
    pub fn oem(&self) -> u8 {
        match self {
            EngineMode::LstmOnly => 1,
            EngineMode::Default => 3,
        }
    }
}

/// Ordered, non-empty list of language codes. The first one is the primary language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet(Vec<String>);

impl LanguageSet {
    pub fn single(language: impl Into<String>) -> Self {
        Self(vec![language.into()])
    }

    /// Returns `None` when `primary` is empty.
    pub fn with_extras(primary: &str, extras: &[String]) -> Option<Self> {
        if primary.is_empty() {
            return None;
        }
        let mut langs = vec![primary.to_string()];
        for lang in extras {
            if !langs.contains(lang) {
                langs.push(lang.clone());
            }
        }
        Some(Self(langs))
    }

    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Tesseract `-l` argument, e.g. `eng+fra`.
    pub fn to_tesseract_arg(&self) -> String {
        self.0.join("+")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionParams {
    pub segmentation: SegmentationMode,
    pub engine: EngineMode,
    pub languages: LanguageSet,
    pub preserve_interword_spaces: bool,
}

/// Raw recognizer output for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recognition {
    pub text: String,
    pub tokens: Vec<RecognitionToken>,
}

/// A text recognition capability.
///
/// Implementations must be safe to call from several threads at once.
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(
        &self,
        image: &GrayImage,
        params: &RecognitionParams,
    ) -> Result<Recognition, RecognizerError>;
}

/// Run `recognizer` on a worker thread, giving up after `timeout`.
pub fn recognize_bounded(
    recognizer: &Arc<dyn TextRecognizer>,
    image: GrayImage,
    params: RecognitionParams,
    timeout: Option<Duration>,
) -> Result<Recognition, RecognizerError> {
    let recognizer = Arc::clone(recognizer);
    match run_bounded(timeout, move || recognizer.recognize(&image, &params)) {
        Ok(result) => result,
        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
            Err(RecognizerError::TimedOut(timeout.unwrap_or_default()))
        }
        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => Err(RecognizerError::EngineFailed(
            "recognizer worker exited without a result".to_string(),
        )),
    }
}

/// Tesseract via its command-line tool.
pub struct TesseractRecognizer {
    binary: PathBuf,
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_tesseract(
        &self,
        image_path: &Path,
        params: &RecognitionParams,
    ) -> Result<String, RecognizerError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(image_path)
            .arg("stdout")
            .args(["--psm", &params.segmentation.psm().to_string()])
            .args(["--oem", &params.engine.oem().to_string()])
            .args(["-l", &params.languages.to_tesseract_arg()]);
        if params.preserve_interword_spaces {
            command.args(["-c", "preserve_interword_spaces=1"]);
        }
        command.arg("tsv");

        match command.output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(RecognizerError::EngineFailed(format!(
                    "tesseract failed: {}",
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RecognizerError::EngineUnavailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(RecognizerError::Io(e)),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &GrayImage,
        params: &RecognitionParams,
    ) -> Result<Recognition, RecognizerError> {
        let file = tempfile::Builder::new().suffix(".png").tempfile()?;
        image
            .save_with_format(file.path(), image::ImageFormat::Png)
            .map_err(|e| RecognizerError::EngineFailed(format!("Failed to stage image: {}", e)))?;

        let tsv = self.run_tesseract(file.path(), params)?;
        Ok(parse_tsv(&tsv))
    }
}

/// Parse tesseract TSV output into word tokens and reflowed text.
///
/// Words on one line are joined by a space, lines by a newline, and a new
/// paragraph or block starts after a blank line.
fn parse_tsv(tsv: &str) -> Recognition {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut last_line: Option<(u32, u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 || cols[0] != "5" {
            continue;
        }

        let parse = |i: usize| cols[i].trim().parse::<i64>().unwrap_or(0);
        let (block, par, line) = (parse(2) as u32, parse(3) as u32, parse(4) as u32);
        let confidence = cols[10]
            .trim()
            .parse::<f32>()
            .map(|c| c.round() as i32)
            .unwrap_or(-1);
        let word = cols.get(11).copied().unwrap_or("").trim_end_matches('\r');

        tokens.push(RecognitionToken {
            text: word.to_string(),
            confidence,
            group_index: block,
            bbox: BoundingBox::new(
                parse(6).max(0) as u32,
                parse(7).max(0) as u32,
                parse(8).max(0) as u32,
                parse(9).max(0) as u32,
            ),
        });

        if word.trim().is_empty() {
            continue;
        }
        match last_line {
            None => {}
            Some((b, p, _)) if b != block || p != par => text.push_str("\n\n"),
            Some((_, _, l)) if l != line => text.push('\n'),
            Some(_) => text.push(' '),
        }
        text.push_str(word);
        last_line = Some((block, par, line));
    }

    if !text.is_empty() {
        text.push('\n');
    }

    Recognition { text, tokens }
}

/// Pure-Rust recognizer backed by ocrs.
///
/// The engine is loaded on first use and shared by all callers; ocrs engines
/// take `&self` and are `Send + Sync`.
pub struct OcrsRecognizer {
    model_dir: Option<PathBuf>,
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsRecognizer {
    pub fn new() -> Self {
        Self {
            model_dir: None,
            engine: Mutex::new(None),
        }
    }

    /// Load models from `dir` instead of `~/.cache/ocrs`.
    pub fn with_model_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(dir.into()),
            engine: Mutex::new(None),
        }
    }

    fn engine(&self) -> Result<Arc<OcrEngine>, RecognizerError> {
        let mut guard = self
            .engine
            .lock()
            .map_err(|_| RecognizerError::EngineFailed("OCR engine lock poisoned".to_string()))?;

        if let Some(engine) = guard.as_ref() {
            return Ok(Arc::clone(engine));
        }

        tracing::debug!("initializing ocrs engine");
        let engine = Arc::new(init_ocr_engine(self.model_dir.as_deref())?);
        *guard = Some(Arc::clone(&engine));
        Ok(engine)
    }
}

impl Default for OcrsRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize OCR engine with models from `model_dir` or the standard cache location
pub fn init_ocr_engine(model_dir: Option<&Path>) -> Result<OcrEngine, RecognizerError> {
    let cache_dir = match model_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let home_dir = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .map_err(|_| {
                    RecognizerError::EngineUnavailable("no home directory for model cache".into())
                })?;
            Path::new(&home_dir).join(".cache/ocrs")
        }
    };
    let detection_model_path = cache_dir.join("text-detection.rten");
    let recognition_model_path = cache_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(RecognizerError::EngineUnavailable(format!(
            "OCR models not found. Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        )));
    }

    let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
        RecognizerError::EngineFailed(format!("Failed to load detection model: {}", e))
    })?;
    let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
        RecognizerError::EngineFailed(format!("Failed to load recognition model: {}", e))
    })?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| RecognizerError::EngineFailed(format!("Failed to create OCR engine: {}", e)))
}

impl TextRecognizer for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize(
        &self,
        image: &GrayImage,
        params: &RecognitionParams,
    ) -> Result<Recognition, RecognizerError> {
        let engine = self.engine()?;
        tracing::trace!(
            psm = params.segmentation.psm(),
            oem = params.engine.oem(),
            languages = %params.languages.to_tesseract_arg(),
            "ocrs ignores layout, engine and language parameters"
        );

        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| RecognizerError::EngineFailed(format!("Failed to convert image: {}", e)))?;
        let input = engine
            .prepare_input(source)
            .map_err(|e| RecognizerError::EngineFailed(format!("Failed to prepare input: {}", e)))?;

        let word_rects = engine
            .detect_words(&input)
            .map_err(|e| RecognizerError::EngineFailed(format!("Word detection failed: {}", e)))?;
        let line_rects = engine.find_text_lines(&input, &word_rects);
        let lines = engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| RecognizerError::EngineFailed(format!("Recognition failed: {}", e)))?;

        let mut tokens = Vec::new();
        let mut text_lines = Vec::new();

        for (line_index, line) in lines.iter().enumerate() {
            let Some(line) = line else { continue };
            let mut words = Vec::new();

            for word in line.words() {
                let word_text = word.to_string();
                if word_text.trim().is_empty() {
                    continue;
                }
                let rect = word.bounding_rect();
                tokens.push(RecognitionToken {
                    text: word_text.clone(),
                    confidence: 100,
                    group_index: line_index as u32,
                    bbox: BoundingBox::new(
                        rect.left().max(0) as u32,
                        rect.top().max(0) as u32,
                        rect.width().max(0) as u32,
                        rect.height().max(0) as u32,
                    ),
                });
                words.push(word_text);
            }

            if !words.is_empty() {
                text_lines.push(words.join(" "));
            }
        }

        Ok(Recognition {
            text: text_lines.join("\n"),
            tokens,
        })
    }
}
