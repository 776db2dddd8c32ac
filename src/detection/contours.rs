use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::models::Region;

/// Trace every boundary (outer and hole borders, at any nesting depth) of the
/// non-zero regions in a binary image.
pub fn find_regions(binary: &GrayImage) -> Vec<Region> {
    find_contours::<i64>(binary)
        .into_iter()
        .enumerate()
        .filter_map(|(index, contour)| {
            let min_x = contour.points.iter().map(|p| p.x).min()?;
            let min_y = contour.points.iter().map(|p| p.y).min()?;
            let max_x = contour.points.iter().map(|p| p.x).max()?;
            let max_y = contour.points.iter().map(|p| p.y).max()?;

            Some(Region {
                index,
                area: polygon_area(&contour.points),
                min_x: min_x as u32,
                min_y: min_y as u32,
                max_x: max_x as u32,
                max_y: max_y as u32,
                is_hole: matches!(contour.border_type, BorderType::Hole),
            })
        })
        .collect()
}

/// Unsigned shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point<i64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();

    twice.abs() as f64 / 2.0
}

/// Area and shape limits a region must meet to be treated as a table candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionFilter {
    pub min_area: f64,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self {
            min_area: 10_000.0,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 5.0,
        }
    }
}

impl RegionFilter {
    /// Both ends of the area and aspect ranges are inclusive.
    pub fn accepts(&self, area: f64, width: u32, height: u32) -> bool {
        if area < self.min_area || height == 0 {
            return false;
        }
        let aspect = width as f32 / height as f32;
        aspect >= self.min_aspect_ratio && aspect <= self.max_aspect_ratio
    }

    pub fn accepts_region(&self, region: &Region) -> bool {
        self.accepts(region.area, region.width(), region.height())
    }
}

/// Keep regions that pass the filter
pub fn filter_candidates(regions: &[Region], filter: &RegionFilter) -> Vec<Region> {
    regions
        .iter()
        .filter(|r| filter.accepts_region(r))
        .cloned()
        .collect()
}
