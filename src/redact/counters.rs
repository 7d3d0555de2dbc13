use std::ops::AddAssign;

use serde::Serialize;

/// What a redaction pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub images_removed: usize,
    pub hyperlinks_removed: usize,
    pub text_replacements: usize,
    pub styles_reset: usize,
    pub shading_removed: usize,
    pub borders_removed: usize,
    pub content_controls_unwrapped: usize,
    pub relationships_cleaned: usize,
    pub assets_deleted: usize,
}

impl Counters {
    /// Check whether nothing was changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, other: Self) {
        self.images_removed += other.images_removed;
        self.hyperlinks_removed += other.hyperlinks_removed;
        self.text_replacements += other.text_replacements;
        self.styles_reset += other.styles_reset;
        self.shading_removed += other.shading_removed;
        self.borders_removed += other.borders_removed;
        self.content_controls_unwrapped += other.content_controls_unwrapped;
        self.relationships_cleaned += other.relationships_cleaned;
        self.assets_deleted += other.assets_deleted;
    }
}
