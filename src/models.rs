use image::GrayImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Axis-aligned box in image pixel coordinates.
///
/// Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}

impl From<[u32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        Self { x, y, width, height }
    }
}

impl From<BoundingBox> for [u32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// Candidate region found by contour tracing.
#[derive(Debug, Clone)]
pub struct Region {
    /// Index of the contour in tracing order
    pub index: usize,
    /// Area enclosed by the traced boundary (shoelace over pixel centres)
    pub area: f64,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// True when the boundary is a hole border rather than an outer border
    pub is_hole: bool,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.bbox().aspect_ratio()
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.min_x, self.min_y, self.width(), self.height())
    }

    /// Crop the region out of `img`, clamped to the image bounds.
    pub fn extract_roi(&self, img: &GrayImage) -> Option<GrayImage> {
        let (img_w, img_h) = img.dimensions();
        if self.min_x >= img_w || self.min_y >= img_h {
            return None;
        }
        let width = self.width().min(img_w - self.min_x);
        let height = self.height().min(img_h - self.min_y);

        if width == 0 || height == 0 {
            return None;
        }

        Some(image::imageops::crop_imm(img, self.min_x, self.min_y, width, height).to_image())
    }
}

/// One word-level fragment reported by a text recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionToken {
    pub text: String,
    /// 0..=100, or negative when the engine reports no confidence
    pub confidence: i32,
    /// Line/block the token belongs to
    pub group_index: u32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableArtifact {
    pub id: Uuid,
    pub html: String,
    pub bbox: BoundingBox,
}

/// Diagram families recognised by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    ClassDiagram,
    StateDiagram,
    EntityRelationship,
    Gantt,
    PieChart,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 7] = [
        DiagramKind::Flowchart,
        DiagramKind::Sequence,
        DiagramKind::ClassDiagram,
        DiagramKind::StateDiagram,
        DiagramKind::EntityRelationship,
        DiagramKind::Gantt,
        DiagramKind::PieChart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequence",
            DiagramKind::ClassDiagram => "classDiagram",
            DiagramKind::StateDiagram => "stateDiagram",
            DiagramKind::EntityRelationship => "entityRelationship",
            DiagramKind::Gantt => "gantt",
            DiagramKind::PieChart => "pieChart",
        }
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramArtifact {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: DiagramKind,
    pub markup: String,
}

/// Everything recovered from one document image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    pub text: String,
    #[serde(skip)]
    pub tokens: Vec<RecognitionToken>,
    pub tables: Vec<TableArtifact>,
    pub diagrams: Vec<DiagramArtifact>,
    /// Percentage in `[0, 100]`
    pub confidence: f64,
    pub languages: Vec<String>,
    pub page_count: u32,
}
