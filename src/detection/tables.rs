use image::GrayImage;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::detection::contours::{self, RegionFilter};
use crate::detection::ocr::{recognize_bounded, RecognitionParams, TextRecognizer};
use crate::models::{Region, RecognitionToken, TableArtifact};

/// Finds tabular regions in a binarized page and renders each as HTML.
pub trait TableDetector: Send + Sync {
    fn detect(&self, binarized: &GrayImage) -> Vec<TableArtifact>;
}

/// Contour-based table detector.
///
/// Every traced boundary large and wide enough is cropped and re-recognized;
/// a region whose confident tokens fall into at least two groups is a table.
pub struct ContourTableDetector {
    recognizer: Arc<dyn TextRecognizer>,
    params: RecognitionParams,
    filter: RegionFilter,
    timeout: Option<Duration>,
}

impl ContourTableDetector {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, params: RecognitionParams) -> Self {
        Self {
            recognizer,
            params,
            filter: RegionFilter::default(),
            timeout: None,
        }
    }

    pub fn with_filter(mut self, filter: RegionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Regions of `binarized` that qualify for region recognition.
    pub fn candidates(&self, binarized: &GrayImage) -> Vec<Region> {
        let regions = contours::find_regions(binarized);
        let candidates = contours::filter_candidates(&regions, &self.filter);
        tracing::debug!(
            contours = regions.len(),
            candidates = candidates.len(),
            "table candidate regions"
        );
        candidates
    }

    fn detect_in_region(&self, binarized: &GrayImage, region: &Region) -> Option<TableArtifact> {
        let roi = region.extract_roi(binarized)?;

        let recognition =
            match recognize_bounded(&self.recognizer, roi, self.params.clone(), self.timeout) {
                Ok(recognition) => recognition,
                Err(e) => {
                    tracing::warn!(region = region.index, "region recognition failed: {}", e);
                    return None;
                }
            };

        let Some(html) = tokens_to_html(&recognition.tokens) else {
            tracing::debug!(region = region.index, "region has fewer than two rows");
            return None;
        };

        Some(TableArtifact {
            id: Uuid::new_v4(),
            html,
            bbox: region.bbox(),
        })
    }
}

impl TableDetector for ContourTableDetector {
    fn detect(&self, binarized: &GrayImage) -> Vec<TableArtifact> {
        self.candidates(binarized)
            .iter()
            .filter_map(|region| self.detect_in_region(binarized, region))
            .collect()
    }
}

/// Group confident token texts by group index, in index order.
pub fn group_rows(tokens: &[RecognitionToken]) -> BTreeMap<u32, Vec<&str>> {
    let mut rows: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    for token in tokens.iter().filter(|t| t.confidence > 0) {
        rows.entry(token.group_index)
            .or_default()
            .push(token.text.as_str());
    }
    rows
}

/// Render tokens as an HTML table.
///
/// The lowest group index is the header row and every other group is a body
/// row. Returns `None` unless at least two groups have a confident token.
pub fn tokens_to_html(tokens: &[RecognitionToken]) -> Option<String> {
    let rows = group_rows(tokens);
    if rows.len() < 2 {
        return None;
    }

    let mut rows = rows.into_values();
    let header = rows.next()?;

    let mut html = String::from(r#"<table border="1" cellpadding="3" cellspacing="0">"#);

    html.push_str("<thead><tr>");
    for cell in header {
        html.push_str("<th>");
        html.push_str(&escape_html(cell));
        html.push_str("</th>");
    }
    html.push_str("</tr></thead>");

    html.push_str("<tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    Some(html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
