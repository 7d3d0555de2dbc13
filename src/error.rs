//! Error types for blinder operations.
//!
//! Only document-level and input-validation failures are errors. Faults
//! confined to a single node are reported as [`NodeWarning`]s on the
//! redaction result instead.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while reading, redacting or writing a document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt container: {0}")]
    ContainerCorrupt(String),

    #[error("Invalid replacement rule #{rule} ({pattern:?}): {source}")]
    Pattern {
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid redaction options: {0}")]
    InvalidOptions(String),

    #[error("Failed to write output during {stage}: {source}")]
    PartialWrite {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Wrap an error raised after output assembly started.
    pub(crate) fn partial_write(stage: &'static str, source: impl Into<Error>) -> Self {
        Error::PartialWrite {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Short name of the pipeline stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat(_) => "detect",
            Error::ContainerCorrupt(_) | Error::Zip(_) => "extract",
            Error::Pattern { .. } | Error::InvalidOptions(_) => "validate",
            Error::Xml(_) | Error::Utf8(_) => "parse",
            Error::PartialWrite { stage, .. } => stage,
            Error::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A recovered fault on a single node.
///
/// The redactor logs the fault, records it here and carries on with the
/// next node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NodeWarning {
    /// Container path of the part (or `"<document>"` for markup/text).
    pub part: String,
    /// Redaction step that failed.
    pub step: &'static str,
    /// What went wrong.
    pub detail: String,
}

impl NodeWarning {
    pub(crate) fn new(part: &str, step: &'static str, detail: impl Into<String>) -> Self {
        Self {
            part: part.to_string(),
            step,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for NodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.part, self.step, self.detail)
    }
}

/// A tree operation that could not be applied to one node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("node {0} does not exist")]
    Missing(u32),

    #[error("node {0} is detached from the tree")]
    Detached(u32),

    #[error("node {0} is not an element")]
    NotElement(u32),

    #[error("{0}")]
    Malformed(String),
}
