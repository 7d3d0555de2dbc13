//! Structural redaction of word-processing parts.
//!
//! [`PartRedactor`] rewrites one content part (body, header, footer, notes);
//! [`neutralize_styles`] and [`neutralize_theme`] flatten the shared style
//! sheet and palette so nothing re-introduces color through inheritance.

mod counters;
mod options;
mod theme;
mod tree;

pub use counters::Counters;
pub use options::{BLACK, RedactionOptions, Strategy};
pub use theme::{neutralize_styles, neutralize_theme};
pub use tree::{NORMAL_STYLE, PartRedactor, PartReport};
