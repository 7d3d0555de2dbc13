//! # blinder
//!
//! Redact images, visual styling and sensitive terms from office documents
//! (word-processing packages, HTML and plain text) while keeping their
//! paragraph and table structure intact.
//!
//! ## Quick Start
//!
//! ```no_run
//! use blinder::{RedactionOptions, ReplacementRule, redact};
//!
//! let input = std::fs::read("report.docx").unwrap();
//! let rules = vec![
//!     ReplacementRule::new("confidential", "[REDACTED]"),
//!     ReplacementRule::new(r"\b\d{3}-\d{2}-\d{4}\b", "[SSN]"),
//! ];
//! let result = redact(&input, &rules, None, &RedactionOptions::default()).unwrap();
//! println!("{} replacements", result.counters.text_replacements);
//! std::fs::write("report_blinded.docx", &result.bytes).unwrap();
//! ```
//!
//! ## Reviewing a redaction
//!
//! [`preview`] redacts in memory and diffs paragraph and table snapshots taken
//! before and after:
//!
//! ```no_run
//! use blinder::{RedactionOptions, preview};
//!
//! let input = std::fs::read("report.docx").unwrap();
//! let preview = preview(&input, &[], None, &RedactionOptions::default()).unwrap();
//! for change in &preview.diff.paragraph_changes {
//!     println!("paragraph {}: {} edits", change.index, change.changes.len());
//! }
//! ```
//!
//! ## Selective image removal
//!
//! Embedded assets are identified by content hash. Pass a set of hashes from
//! [`list_images`] to remove only those assets; `None` or an empty set removes
//! every image.

pub mod classify;
pub mod diff;
pub mod docx;
pub mod dom;
pub mod error;
pub mod images;
pub mod io;
pub mod markup;
pub mod pipeline;
pub mod redact;
pub mod rules;
pub mod structure;
pub mod text;
pub(crate) mod util;

pub use classify::{NodeClass, classify};
pub use diff::{DiffReport, DiffStatistics, diff};
pub use error::{Error, NodeWarning, Result};
pub use images::{ImageAsset, ImageHash, hash_asset};
pub use pipeline::{
    FileReport, Format, Outcome, Preview, RedactedResult, default_output_path, extract_structure,
    list_images, preview, redact, redact_file,
};
pub use redact::{Counters, RedactionOptions, Strategy};
pub use rules::{KeywordEntry, KeywordStore, ReplacementRule, RuleSet, default_keywords};
pub use structure::Snapshot;
