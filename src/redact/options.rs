use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Color every run is forced to when `force_black_text` is set.
pub const BLACK: &str = "000000";

/// How the structural passes are scheduled over a part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Run every pass block by block (paragraph, table), so faults stay
    /// confined to one block.
    #[default]
    Structural,
    /// Run each pass once over the whole part tree.
    Tree,
}

/// What a redaction pass strips and normalizes.
///
/// Every field is independent; none overrides another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionOptions {
    /// Force every run to `font_name` at `font_size` points.
    pub standardize_fonts: bool,
    pub font_name: String,
    /// Size in points; must be positive.
    pub font_size: u32,
    /// Force every run color to black and drop theme color links.
    pub force_black_text: bool,
    pub strip_shading: bool,
    pub strip_images: bool,
    pub strip_hyperlinks: bool,
    pub strip_borders: bool,
    pub strip_content_controls: bool,
    /// Drop numbering and indents and reset paragraph styles to `Normal`.
    pub reset_paragraph_styles: bool,
    pub strategy: Strategy,
}

impl Default for RedactionOptions {
    fn default() -> Self {
        Self {
            standardize_fonts: true,
            font_name: "Calibri".to_string(),
            font_size: 11,
            force_black_text: true,
            strip_shading: true,
            strip_images: true,
            strip_hyperlinks: true,
            strip_borders: true,
            strip_content_controls: true,
            reset_paragraph_styles: true,
            strategy: Strategy::Structural,
        }
    }
}

impl RedactionOptions {
    /// Options that only substitute text and leave all structure alone.
    pub fn text_only() -> Self {
        Self {
            standardize_fonts: false,
            force_black_text: false,
            strip_shading: false,
            strip_images: false,
            strip_hyperlinks: false,
            strip_borders: false,
            strip_content_controls: false,
            reset_paragraph_styles: false,
            ..Self::default()
        }
    }

    /// Reject option combinations that cannot be applied.
    pub fn validate(&self) -> Result<()> {
        if self.font_size == 0 {
            return Err(Error::InvalidOptions("font_size must be positive".to_string()));
        }
        // Run sizes are stored in half-points as an unsigned measure.
        if self.font_size > 1638 {
            return Err(Error::InvalidOptions(format!(
                "font_size {} exceeds the 1638pt maximum",
                self.font_size
            )));
        }
        if self.standardize_fonts && self.font_name.trim().is_empty() {
            return Err(Error::InvalidOptions(
                "font_name must not be empty when standardize_fonts is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Color every run is normalized to, if any.
    pub fn color_target(&self) -> Option<&'static str> {
        self.force_black_text.then_some(BLACK)
    }

    /// Font name and size in half-points every run is normalized to, if any.
    pub fn font_target(&self) -> Option<(&str, u32)> {
        self.standardize_fonts
            .then(|| (self.font_name.as_str(), self.font_size * 2))
    }

    /// Whether run properties need touching at all.
    pub(crate) fn normalizes_runs(&self) -> bool {
        self.force_black_text || self.standardize_fonts
    }
}
