mod common;

use common::*;
use scanstruct::detection::contours::{find_regions, RegionFilter};
use scanstruct::detection::tables::{group_rows, tokens_to_html};
use scanstruct::detection::{
    ContourTableDetector, EngineMode, LanguageSet, RecognitionParams, SegmentationMode,
    TableDetector, TextRecognizer,
};
use scanstruct::BoundingBox;
use std::sync::Arc;

fn region_params() -> RecognitionParams {
    RecognitionParams {
        segmentation: SegmentationMode::Auto,
        engine: EngineMode::Default,
        languages: LanguageSet::single("eng"),
        preserve_interword_spaces: false,
    }
}

#[test]
fn test_two_groups_render_header_and_body() {
    let html = tokens_to_html(&two_row_tokens()).expect("two groups make a table");

    assert_eq!(html.matches("<th>").count(), 3);
    assert_eq!(html.matches("<td>").count(), 2);
    assert_eq!(html.matches("<tr>").count(), 2);
    assert!(html.starts_with("<table"));
    assert!(html.contains("<thead><tr><th>Name</th><th>Age</th><th>City</th></tr></thead>"));
    assert!(html.contains("<tbody><tr><td>Alice</td><td>30</td></tr></tbody>"));
    assert!(html.ends_with("</table>"));
}

#[test]
fn test_fewer_than_two_groups_is_not_a_table() {
    assert!(tokens_to_html(&[]).is_none());
    assert!(tokens_to_html(&[token("Solo", 90, 1), token("Line", 90, 1)]).is_none());
}

#[test]
fn test_unconfident_tokens_are_dropped() {
    // Group 2 only has tokens at or below zero confidence
    let tokens = vec![
        token("Header", 90, 1),
        token("", -1, 2),
        token("noise", 0, 2),
    ];
    assert!(tokens_to_html(&tokens).is_none());

    let rows = group_rows(&tokens);
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_lowest_group_is_header_and_rows_are_sorted() {
    let tokens = vec![
        token("third", 80, 7),
        token("head", 80, 2),
        token("second", 80, 4),
    ];
    let html = tokens_to_html(&tokens).unwrap();

    assert!(html.contains("<thead><tr><th>head</th></tr></thead>"));
    let second = html.find("second").unwrap();
    let third = html.find("third").unwrap();
    assert!(second < third);
}

#[test]
fn test_cell_text_is_escaped() {
    let tokens = vec![token("a<b", 90, 1), token("x&y", 90, 2)];
    let html = tokens_to_html(&tokens).unwrap();
    assert!(html.contains("<th>a&lt;b</th>"));
    assert!(html.contains("<td>x&amp;y</td>"));
}

#[test]
fn test_region_filter_area_boundary() {
    let filter = RegionFilter::default();
    assert!(!filter.accepts(9_999.0, 100, 100));
    assert!(filter.accepts(10_000.0, 100, 100));
}

#[test]
fn test_region_filter_aspect_boundaries() {
    let filter = RegionFilter::default();
    let area = 50_000.0;

    assert!(!filter.accepts(area, 49, 100));
    assert!(filter.accepts(area, 50, 100));
    assert!(filter.accepts(area, 500, 100));
    assert!(!filter.accepts(area, 501, 100));
    assert!(!filter.accepts(area, 100, 0));
}

#[test]
fn test_find_regions_traces_filled_box() {
    let regions = find_regions(&table_page());

    assert_eq!(regions.len(), 1);
    let region = &regions[0];
    assert!(!region.is_hole);
    assert_eq!(region.bbox(), BoundingBox::new(20, 20, 150, 100));
    // Boundary runs through pixel centres: 149 x 99
    assert_eq!(region.area, 14_751.0);
}

#[test]
fn test_find_regions_includes_holes() {
    // White frame around a black interior
    let mut img = page_with_box(400, 300, 20, 20, 200, 150);
    for y in 40..150 {
        for x in 40..200 {
            img.put_pixel(x, y, image::Luma([0u8]));
        }
    }

    let regions = find_regions(&img);
    assert!(regions.iter().any(|r| r.is_hole));
    assert!(regions.iter().any(|r| !r.is_hole));
}

#[test]
fn test_detector_emits_table_for_candidate() {
    let recognizer = Arc::new(ScriptedRecognizer::new("", two_row_tokens()));
    let detector = ContourTableDetector::new(recognizer.clone(), region_params());

    let tables = detector.detect(&table_page());

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].bbox, BoundingBox::new(20, 20, 150, 100));
    assert_eq!(tables[0].html.matches("<th>").count(), 3);
    assert_eq!(recognizer.region_calls(), 1);
}

#[test]
fn test_detector_skips_small_and_narrow_regions() {
    let recognizer = Arc::new(ScriptedRecognizer::new("", two_row_tokens()));
    let detector = ContourTableDetector::new(recognizer.clone(), region_params());

    // 49 x 49 enclosed area
    let small = page_with_box(400, 300, 10, 10, 50, 50);
    assert!(detector.detect(&small).is_empty());

    // Large enough but far taller than wide
    let narrow = page_with_box(400, 300, 10, 10, 60, 250);
    assert!(detector.detect(&narrow).is_empty());

    assert_eq!(recognizer.region_calls(), 0);
}

#[test]
fn test_detector_rejects_single_row_region() {
    let recognizer = Arc::new(ScriptedRecognizer::new("", vec![token("Only", 90, 1)]));
    let detector = ContourTableDetector::new(recognizer.clone(), region_params());

    assert!(detector.detect(&table_page()).is_empty());
    assert_eq!(recognizer.region_calls(), 1);
}

#[test]
fn test_failed_region_recognition_is_skipped() {
    let recognizer: Arc<dyn TextRecognizer> = Arc::new(ScriptedRecognizer::failing_regions(""));
    let detector = ContourTableDetector::new(recognizer, region_params());

    assert!(detector.detect(&table_page()).is_empty());
}

#[test]
fn test_custom_filter_thresholds() {
    let recognizer = Arc::new(ScriptedRecognizer::new("", two_row_tokens()));
    let detector = ContourTableDetector::new(recognizer, region_params()).with_filter(RegionFilter {
        min_area: 1_000.0,
        min_aspect_ratio: 0.5,
        max_aspect_ratio: 5.0,
    });

    let small = page_with_box(400, 300, 10, 10, 50, 50);
    assert_eq!(detector.detect(&small).len(), 1);
}
