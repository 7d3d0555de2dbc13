//! Positional comparison of two snapshots.
//!
//! Paragraphs and tables are paired by index. When the sequences differ in
//! length only the common prefix is compared; extra entries on either side
//! are not reported.

use serde::Serialize;
use similar::{Algorithm, DiffTag, capture_diff_slices};

use crate::structure::{Formatting, Snapshot};

/// Everything that differs between a pre- and post-redaction snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffReport {
    pub paragraph_changes: Vec<ParagraphChange>,
    pub image_changes: Vec<ImageChange>,
    pub table_changes: Vec<TableChange>,
    pub formatting_changes: Vec<FormattingChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphChange {
    pub index: usize,
    pub changes: Vec<TextChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Replace,
    Delete,
    Insert,
}

/// One non-equal span of a character-level edit script.
///
/// `position` is a character offset: into the original text for replace and
/// delete, into the processed text for insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<String>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageChange {
    pub paragraph_index: usize,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableChange {
    pub index: usize,
    pub shading_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattingChange {
    pub paragraph_index: usize,
    pub original: Option<Formatting>,
    pub processed: Option<Formatting>,
}

/// Summary counts of a diff report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStatistics {
    pub images_removed: usize,
    /// Number of non-equal text spans.
    pub keywords_replaced: usize,
    pub formatting_changes: usize,
    pub table_shadings_removed: usize,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.paragraph_changes.is_empty()
            && self.image_changes.is_empty()
            && self.table_changes.is_empty()
            && self.formatting_changes.is_empty()
    }

    pub fn statistics(&self) -> DiffStatistics {
        DiffStatistics {
            images_removed: self.image_changes.len(),
            keywords_replaced: self.paragraph_changes.iter().map(|p| p.changes.len()).sum(),
            formatting_changes: self.formatting_changes.len(),
            table_shadings_removed: self.table_changes.len(),
        }
    }
}

/// Compare two snapshots index by index.
pub fn diff(pre: &Snapshot, post: &Snapshot) -> DiffReport {
    let mut report = DiffReport::default();

    for (index, (before, after)) in pre.paragraphs.iter().zip(&post.paragraphs).enumerate() {
        if before.text != after.text {
            let changes = diff_text(&before.text, &after.text);
            if !changes.is_empty() {
                report.paragraph_changes.push(ParagraphChange { index, changes });
            }
        }
        if before.has_image && !after.has_image {
            report.image_changes.push(ImageChange {
                paragraph_index: index,
                removed: true,
            });
        }
        if before.formatting != after.formatting {
            report.formatting_changes.push(FormattingChange {
                paragraph_index: index,
                original: before.formatting.clone(),
                processed: after.formatting.clone(),
            });
        }
    }

    for (index, (before, after)) in pre.tables.iter().zip(&post.tables).enumerate() {
        if before.has_shading != after.has_shading {
            report.table_changes.push(TableChange {
                index,
                shading_removed: before.has_shading && !after.has_shading,
            });
        }
    }

    report
}

/// Character-level edit script between two strings, equal spans omitted.
pub fn diff_text(original: &str, processed: &str) -> Vec<TextChange> {
    let old: Vec<char> = original.chars().collect();
    let new: Vec<char> = processed.chars().collect();
    let span = |chars: &[char]| chars.iter().collect::<String>();

    capture_diff_slices(Algorithm::Myers, &old, &new)
        .iter()
        .filter_map(|op| {
            let (tag, i, j) = op.as_tag_tuple();
            let change = match tag {
                DiffTag::Equal => return None,
                DiffTag::Replace => TextChange {
                    kind: ChangeKind::Replace,
                    original: Some(span(&old[i.clone()])),
                    processed: Some(span(&new[j])),
                    position: i.start,
                },
                DiffTag::Delete => TextChange {
                    kind: ChangeKind::Delete,
                    original: Some(span(&old[i.clone()])),
                    processed: None,
                    position: i.start,
                },
                DiffTag::Insert => TextChange {
                    kind: ChangeKind::Insert,
                    original: None,
                    processed: Some(span(&new[j.clone()])),
                    position: j.start,
                },
            };
            Some(change)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{CellRecord, ParagraphRecord, TableRecord, extract_text};
    use proptest::prelude::*;

    fn paragraph(index: usize, text: &str, has_image: bool) -> ParagraphRecord {
        ParagraphRecord {
            index,
            text: text.to_string(),
            has_image,
            formatting: None,
            style: "Normal".to_string(),
        }
    }

    #[test]
    fn test_replacement_span() {
        let changes = diff_text("Project status: confidential", "Project status: [REDACTED]");
        let original: String = changes.iter().filter_map(|c| c.original.clone()).collect();
        let processed: String = changes.iter().filter_map(|c| c.processed.clone()).collect();
        assert!(changes.iter().all(|c| c.position >= "Project status: ".len()));
        assert!(original.chars().all(|c| "confidential".contains(c)));
        assert!(processed.chars().all(|c| "[REDACTED]".contains(c)));
    }

    #[test]
    fn test_pure_insert_and_delete() {
        assert_eq!(
            diff_text("ab", "axb"),
            vec![TextChange {
                kind: ChangeKind::Insert,
                original: None,
                processed: Some("x".into()),
                position: 1,
            }]
        );
        assert_eq!(
            diff_text("héllo", "hé"),
            vec![TextChange {
                kind: ChangeKind::Delete,
                original: Some("llo".into()),
                processed: None,
                position: 2,
            }]
        );
    }

    #[test]
    fn test_image_and_prefix_pairing() {
        let pre = Snapshot {
            paragraphs: vec![paragraph(0, "a", true), paragraph(1, "b", false), paragraph(2, "c", false)],
            tables: Vec::new(),
        };
        let post = Snapshot {
            paragraphs: vec![paragraph(0, "a", false), paragraph(1, "B", false)],
            tables: Vec::new(),
        };
        let report = diff(&pre, &post);
        assert_eq!(
            report.image_changes,
            vec![ImageChange {
                paragraph_index: 0,
                removed: true,
            }]
        );
        assert_eq!(report.paragraph_changes.len(), 1);
        assert_eq!(report.paragraph_changes[0].index, 1);
        assert_eq!(report.statistics().keywords_replaced, 1);
    }

    #[test]
    fn test_table_shading_change() {
        let table = |shaded: bool| TableRecord {
            index: 0,
            rows: vec![vec![CellRecord {
                text: "cell".into(),
                has_shading: shaded,
            }]],
            has_shading: shaded,
        };
        let pre = Snapshot {
            paragraphs: Vec::new(),
            tables: vec![table(true)],
        };
        let post = Snapshot {
            paragraphs: Vec::new(),
            tables: vec![table(false)],
        };
        let report = diff(&pre, &post);
        assert_eq!(
            report.table_changes,
            vec![TableChange {
                index: 0,
                shading_removed: true,
            }]
        );
        assert_eq!(report.statistics().table_shadings_removed, 1);
    }

    #[test]
    fn test_formatting_change() {
        let mut pre = Snapshot::default();
        pre.paragraphs.push(ParagraphRecord {
            formatting: Some(Formatting {
                font_color: Some("#ff0000".into()),
                ..Formatting::default()
            }),
            ..paragraph(0, "x", false)
        });
        let mut post = pre.clone();
        post.paragraphs[0].formatting = Some(Formatting {
            font_color: Some("#000000".into()),
            ..Formatting::default()
        });
        let report = diff(&pre, &post);
        assert_eq!(report.formatting_changes.len(), 1);
        assert!(report.paragraph_changes.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let change = &diff_text("a", "")[0];
        let json = serde_json::to_value(change).unwrap();
        assert_eq!(json, serde_json::json!({"type": "delete", "original": "a", "position": 0}));
    }

    proptest! {
        #[test]
        fn prop_self_diff_is_empty(text in "(\\PC{0,20}\n\n){0,5}") {
            let snapshot = extract_text(&text);
            prop_assert!(diff(&snapshot, &snapshot).is_empty());
        }

        #[test]
        fn prop_changes_rebuild_processed(a in "[a-c]{0,12}", b in "[a-c]{0,12}") {
            let changes = diff_text(&a, &b);
            let inserted: usize = changes
                .iter()
                .filter_map(|c| c.processed.as_ref())
                .map(|s| s.chars().count())
                .sum();
            let removed: usize = changes
                .iter()
                .filter_map(|c| c.original.as_ref())
                .map(|s| s.chars().count())
                .sum();
            prop_assert_eq!(
                a.chars().count() as isize - removed as isize + inserted as isize,
                b.chars().count() as isize
            );
        }
    }
}
