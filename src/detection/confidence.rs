/// Scores the quality of recognized text.
pub trait ConfidenceScorer: Send + Sync {
    /// A value in `[0, 100]`.
    fn score(&self, text: &str) -> f64;
}

/// Percentage of characters that are alphanumeric or whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterRatioScorer;

impl ConfidenceScorer for CharacterRatioScorer {
    fn score(&self, text: &str) -> f64 {
        let (clean, total) = text.chars().fold((0usize, 0usize), |(clean, total), c| {
            let ok = c.is_alphanumeric() || c.is_whitespace();
            (clean + ok as usize, total + 1)
        });

        if total == 0 {
            return 0.0;
        }
        100.0 * clean as f64 / total as f64
    }
}
