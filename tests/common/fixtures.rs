use image::{GrayImage, ImageFormat, Luma};
use scanstruct::detection::{Recognition, RecognitionParams, SegmentationMode, TextRecognizer};
use scanstruct::{BoundingBox, RecognitionToken, RecognizerError};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

/// Black page with one filled white rectangle.
pub fn page_with_box(width: u32, height: u32, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |px, py| {
        if px >= x && px < x + w && py >= y && py < y + h {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// 400x300 page whose only foreground is a 150x100 box at (20, 20).
pub fn table_page() -> GrayImage {
    page_with_box(400, 300, 20, 20, 150, 100)
}

/// Encode an image to PNG bytes in memory.
pub fn png_bytes(img: &GrayImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("Failed to encode test image");
    buf
}

pub fn token(text: &str, confidence: i32, group_index: u32) -> RecognitionToken {
    RecognitionToken {
        text: text.to_string(),
        confidence,
        group_index,
        bbox: BoundingBox::new(0, 0, 10, 10),
    }
}

/// Two rows: three header cells in group 1, two body cells in group 2.
pub fn two_row_tokens() -> Vec<RecognitionToken> {
    vec![
        token("Name", 95, 1),
        token("Age", 93, 1),
        token("City", 90, 1),
        token("Alice", 88, 2),
        token("30", 87, 2),
    ]
}

/// Recognizer that answers from a script.
///
/// Full-page calls (automatic segmentation with orientation detection) return
/// `page`; every other call returns `region`, or fails when `region` is `None`.
pub struct ScriptedRecognizer {
    pub page: Recognition,
    pub region: Option<Recognition>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<RecognitionParams>>,
}

impl ScriptedRecognizer {
    pub fn new(page_text: &str, region_tokens: Vec<RecognitionToken>) -> Self {
        Self {
            page: Recognition {
                text: page_text.to_string(),
                tokens: Vec::new(),
            },
            region: Some(Recognition {
                text: String::new(),
                tokens: region_tokens,
            }),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_regions(page_text: &str) -> Self {
        Self {
            region: None,
            ..Self::new(page_text, Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded(&self) -> Vec<RecognitionParams> {
        self.calls.lock().unwrap().clone()
    }

    pub fn region_calls(&self) -> usize {
        self.recorded()
            .iter()
            .filter(|p| p.segmentation != SegmentationMode::AutoWithOsd)
            .count()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(
        &self,
        _image: &GrayImage,
        params: &RecognitionParams,
    ) -> Result<Recognition, RecognizerError> {
        self.calls.lock().unwrap().push(params.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if params.segmentation == SegmentationMode::AutoWithOsd {
            return Ok(self.page.clone());
        }
        self.region
            .clone()
            .ok_or_else(|| RecognizerError::EngineFailed("scripted region failure".to_string()))
    }
}

/// Recognizer whose every call fails.
pub struct BrokenRecognizer;

impl TextRecognizer for BrokenRecognizer {
    fn name(&self) -> &str {
        "broken"
    }

    fn recognize(
        &self,
        _image: &GrayImage,
        _params: &RecognitionParams,
    ) -> Result<Recognition, RecognizerError> {
        Err(RecognizerError::EngineUnavailable("engine offline".to_string()))
    }
}
