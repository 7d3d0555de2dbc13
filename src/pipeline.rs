//! Document-level operations: detect, redact, extract, preview.
//!
//! Rules and options are validated before any part is touched. Parse and
//! container failures abort the call without output; node-level faults are
//! collected as warnings on the result.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::diff::{DiffReport, DiffStatistics, diff};
use crate::docx::Package;
use crate::error::{Error, NodeWarning, Result};
use crate::images::{
    ImageAsset, ImageFilter, ImageHash, clean_relationships, delete_unreferenced_assets,
    list_assets, marked_ids, resolve_selection,
};
use crate::io::{Container, ScratchDir};
use crate::markup::redact_markup;
use crate::redact::{Counters, PartRedactor, RedactionOptions, neutralize_styles, neutralize_theme};
use crate::rules::{ReplacementRule, RuleSet};
use crate::structure::{Snapshot, extract_docx, extract_markup, extract_text};
use crate::text::redact_text;
use crate::util::decode_text;

/// Bytes inspected when sniffing a document's format.
const SNIFF_LEN: usize = 8192;

/// Suffix added to the file stem of default output paths.
pub const OUTPUT_SUFFIX: &str = "_blinded";

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Word-processing package (`.docx`).
    Docx,
    /// Markup document (`.html`, `.htm`).
    Html,
    /// Plain text (`.txt`).
    Txt,
}

impl Format {
    /// Sniff the format from document content.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
            return Ok(Format::Docx);
        }

        let head = &bytes[..bytes.len().min(SNIFF_LEN)];
        if memchr::memchr(0, head).is_some() {
            return Err(Error::UnsupportedFormat(
                "binary content that is not a word-processing package".to_string(),
            ));
        }

        let text = decode_text(head, None).to_ascii_lowercase();
        let text = text.trim_start_matches('\u{feff}').trim_start();
        let is_markup = text.starts_with("<!doctype html")
            || text.starts_with("<html")
            || ["<html", "<body", "<head"].iter().any(|tag| text.contains(tag));
        Ok(if is_markup { Format::Html } else { Format::Txt })
    }

    /// Map a file extension to a format.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "docx" => Ok(Format::Docx),
            "html" | "htm" => Ok(Format::Html),
            "txt" => Ok(Format::Txt),
            "" => Err(Error::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(Error::UnsupportedFormat(format!(
                ".{other} (supported: .docx, .html, .htm, .txt)"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Docx => "docx",
            Format::Html => "html",
            Format::Txt => "txt",
        }
    }
}

/// Whether every node was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "warnings", rename_all = "snake_case")]
pub enum Outcome {
    Complete,
    CompletedWithWarnings(usize),
}

/// A redacted document.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: Format,
    pub counters: Counters,
    pub warnings: Vec<NodeWarning>,
}

impl RedactedResult {
    pub fn outcome(&self) -> Outcome {
        match self.warnings.len() {
            0 => Outcome::Complete,
            n => Outcome::CompletedWithWarnings(n),
        }
    }
}

/// Redact a document, detecting its format from content.
pub fn redact(
    bytes: &[u8],
    rules: &[ReplacementRule],
    selection: Option<&HashSet<ImageHash>>,
    options: &RedactionOptions,
) -> Result<RedactedResult> {
    redact_as(Format::detect(bytes)?, bytes, rules, selection, options)
}

/// Redact a document of a known format.
pub fn redact_as(
    format: Format,
    bytes: &[u8],
    rules: &[ReplacementRule],
    selection: Option<&HashSet<ImageHash>>,
    options: &RedactionOptions,
) -> Result<RedactedResult> {
    options.validate()?;
    let rules = RuleSet::new(rules)?;

    let result = match format {
        Format::Docx => redact_docx(bytes, &rules, selection, options)?,
        Format::Html => {
            let redaction = redact_markup(&decode_text(bytes, None), &rules, options);
            RedactedResult {
                bytes: redaction.html.into_bytes(),
                format,
                counters: redaction.counters,
                warnings: redaction.warnings,
            }
        }
        Format::Txt => {
            let (bytes, counters) = redact_text(bytes, &rules);
            RedactedResult {
                bytes,
                format,
                counters,
                warnings: Vec::new(),
            }
        }
    };

    tracing::info!(
        format = format.extension(),
        counters = ?result.counters,
        warnings = result.warnings.len(),
        "redacted document"
    );
    Ok(result)
}

fn redact_docx(
    bytes: &[u8],
    rules: &RuleSet,
    selection: Option<&HashSet<ImageHash>>,
    options: &RedactionOptions,
) -> Result<RedactedResult> {
    let mut package = Package::open(bytes)?;

    let marked = if options.strip_images {
        resolve_selection(&list_assets(package.container()), selection)
    } else {
        BTreeSet::new()
    };
    let remove_all = options.strip_images && selection.is_none_or(|s| s.is_empty());
    tracing::debug!(marked = marked.len(), remove_all, "resolved image selection");

    let mut counters = Counters::default();
    let mut warnings = Vec::new();

    for part in package.content_parts().to_vec() {
        let mut dom = package.load_xml(&part.path)?;
        let mut rels = package.load_rels(&part.path)?;
        let filter = if options.strip_images {
            ImageFilter::for_part(rels.as_ref(), &marked, remove_all)
        } else {
            ImageFilter::Keep
        };

        let report = PartRedactor::new(&mut dom, &part.path, rules, options, &filter).run();
        counters += report.counters;
        warnings.extend(report.warnings);

        if let Some(rels) = rels.as_mut() {
            let mut stale: HashSet<String> = match &filter {
                ImageFilter::Keep => HashSet::new(),
                ImageFilter::All => marked_ids(rels, &marked),
                ImageFilter::Referencing(ids) => ids.clone(),
            };
            stale.extend(report.unlinked);
            match clean_relationships(&dom, rels, &stale) {
                Ok(removed) => counters.relationships_cleaned += removed,
                Err(e) => {
                    tracing::warn!(part = %part.path, error = %e, "relationship cleanup skipped");
                    warnings.push(NodeWarning::new(&part.path, "clean_relationships", e.to_string()));
                }
            }
            package.store_rels(rels);
        }
        package.store_xml(&part.path, &dom);
    }

    neutralize_shared_parts(&mut package, options, &mut counters, &mut warnings)?;

    if !marked.is_empty() {
        counters.assets_deleted = delete_unreferenced_assets(package.container_mut(), &marked)
            .map_err(|e| Error::partial_write("delete_assets", e))?;
    }

    let bytes = package
        .to_bytes()
        .map_err(|e| Error::partial_write("rebuild", e))?;
    Ok(RedactedResult {
        bytes,
        format: Format::Docx,
        counters,
        warnings,
    })
}

/// Flatten the styles part and theme palettes.
fn neutralize_shared_parts(
    package: &mut Package,
    options: &RedactionOptions,
    counters: &mut Counters,
    warnings: &mut Vec<NodeWarning>,
) -> Result<()> {
    if options.force_black_text || options.strip_shading || options.strip_borders {
        if let Some(path) = package.styles_part().map(str::to_string) {
            let mut dom = package.load_xml(&path)?;
            match neutralize_styles(&mut dom, options) {
                Ok(changed) => *counters += changed,
                Err(e) => warnings.push(NodeWarning::new(&path, "neutralize_styles", e.to_string())),
            }
            package.store_xml(&path, &dom);
        }
    }

    if options.force_black_text {
        for path in package.theme_parts().to_vec() {
            let mut dom = package.load_xml(&path)?;
            if let Err(e) = neutralize_theme(&mut dom) {
                warnings.push(NodeWarning::new(&path, "neutralize_theme", e.to_string()));
            }
            package.store_xml(&path, &dom);
        }
    }
    Ok(())
}

/// Extract the paragraph and table snapshot of a document.
pub fn extract_structure(bytes: &[u8]) -> Result<Snapshot> {
    extract_structure_as(Format::detect(bytes)?, bytes)
}

pub fn extract_structure_as(format: Format, bytes: &[u8]) -> Result<Snapshot> {
    match format {
        Format::Docx => extract_docx(bytes),
        Format::Html => Ok(extract_markup(&decode_text(bytes, None))),
        Format::Txt => Ok(extract_text(&decode_text(bytes, None))),
    }
}

/// Embedded assets of a document with their hashes, for building a selection.
///
/// Markup and text documents have no embedded assets.
pub fn list_images(bytes: &[u8]) -> Result<Vec<ImageAsset>> {
    match Format::detect(bytes)? {
        Format::Docx => Ok(list_assets(&Container::from_bytes(bytes.to_vec())?)),
        Format::Html | Format::Txt => Ok(Vec::new()),
    }
}

/// Before and after snapshots of a redaction with their diff.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub pre: Snapshot,
    pub post: Snapshot,
    pub diff: DiffReport,
    pub statistics: DiffStatistics,
    pub result: RedactedResult,
}

/// Redact a document in memory and report what changed.
pub fn preview(
    bytes: &[u8],
    rules: &[ReplacementRule],
    selection: Option<&HashSet<ImageHash>>,
    options: &RedactionOptions,
) -> Result<Preview> {
    let format = Format::detect(bytes)?;
    let pre = extract_structure_as(format, bytes)?;
    let result = redact_as(format, bytes, rules, selection, options)?;
    let post = extract_structure_as(format, &result.bytes)?;
    let diff = diff(&pre, &post);
    let statistics = diff.statistics();
    Ok(Preview {
        pre,
        post,
        diff,
        statistics,
        result,
    })
}

/// `<dir>/<stem>_blinded.<ext>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_SUFFIX}"),
    };
    input.with_file_name(name)
}

/// Outcome of redacting a file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub result: RedactedResult,
}

/// Redact a file, writing the output through a private scratch directory.
///
/// The format comes from the input's extension. Without `output`, the result
/// is written to [`default_output_path`].
pub fn redact_file(
    input: &Path,
    output: Option<&Path>,
    rules: &[ReplacementRule],
    selection: Option<&HashSet<ImageHash>>,
    options: &RedactionOptions,
) -> Result<FileReport> {
    let format = Format::from_path(input)?;
    let bytes = fs::read(input)?;
    let result = redact_as(format, &bytes, rules, selection, options)?;

    let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
    let scratch = ScratchDir::new("redact")?;
    let file_name = format!("output.{}", format.extension());
    let staged = scratch
        .stage(&file_name, &result.bytes)
        .map_err(|e| Error::partial_write("stage", e))?;
    scratch
        .persist(&staged, &output)
        .map_err(|e| Error::partial_write("persist", e))?;
    scratch.close()?;

    tracing::info!(input = %input.display(), output = %output.display(), "wrote redacted file");
    Ok(FileReport {
        input: input.to_path_buf(),
        output,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Format::detect(b"PK\x03\x04rest").unwrap(), Format::Docx);
        assert_eq!(
            Format::detect(b"\xef\xbb\xbf<!DOCTYPE html><html></html>").unwrap(),
            Format::Html
        );
        assert_eq!(Format::detect(b"hello\n\nworld").unwrap(), Format::Txt);
        assert_eq!(Format::detect(b"").unwrap(), Format::Txt);
        assert!(matches!(
            Format::detect(b"\x89PNG\r\n\x1a\n\0\0"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path(Path::new("a/Report.DOCX")).unwrap(), Format::Docx);
        assert_eq!(Format::from_path(Path::new("page.htm")).unwrap(), Format::Html);
        assert!(matches!(
            Format::from_path(Path::new("sheet.xlsx")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(Format::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/in/report.docx")),
            PathBuf::from("/tmp/in/report_blinded.docx")
        );
        assert_eq!(default_output_path(Path::new("notes")), PathBuf::from("notes_blinded"));
    }

    #[test]
    fn test_invalid_rule_fails_before_output() {
        let rules = [ReplacementRule::new("ok", "[X]"), ReplacementRule::new(r"\b[unclosed", "[Y]")];
        let err = redact(b"some text", &rules, None, &RedactionOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Pattern { rule: 1, .. }));
        assert_eq!(err.stage(), "validate");
    }

    #[test]
    fn test_outcome() {
        let mut result = redact(b"text", &[], None, &RedactionOptions::default()).unwrap();
        assert_eq!(result.outcome(), Outcome::Complete);
        result
            .warnings
            .push(NodeWarning::new("word/document.xml", "remove_images", "gone"));
        assert_eq!(result.outcome(), Outcome::CompletedWithWarnings(1));
    }

    #[test]
    fn test_corrupt_package() {
        let err = redact(b"PK\x03\x04garbage", &[], None, &RedactionOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ContainerCorrupt(_)));
    }

    #[test]
    fn test_text_preview() {
        let rules = [ReplacementRule::new("secret", "[REDACTED]")];
        let preview = preview(
            b"a secret plan\n\nnothing here",
            &rules,
            None,
            &RedactionOptions::default(),
        )
        .unwrap();
        assert_eq!(preview.post.paragraphs[0].text, "a [REDACTED] plan");
        assert_eq!(preview.diff.paragraph_changes.len(), 1);
        assert_eq!(preview.diff.paragraph_changes[0].index, 0);
        assert_eq!(preview.result.counters.text_replacements, 1);
    }
}
