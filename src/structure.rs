//! Paragraph and table snapshots of a document, used to review a redaction.
//!
//! Paragraphs and tables are two separate sequences without a shared
//! ordinal space: a snapshot cannot express where a table sits between two
//! paragraphs.

use std::collections::HashMap;

use serde::Serialize;

use crate::classify::{NodeClass, classify};
use crate::docx::{Package, WordNames};
use crate::dom::{Dom, NodeId, parse_html};
use crate::error::Result;

/// Style name reported for paragraphs without an explicit style.
pub const DEFAULT_STYLE: &str = "Normal";

/// Markup elements treated as paragraphs.
const MARKUP_BLOCKS: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Extracted paragraphs and tables of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub paragraphs: Vec<ParagraphRecord>,
    pub tables: Vec<TableRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphRecord {
    pub index: usize,
    pub text: String,
    pub has_image: bool,
    /// Formatting of the paragraph's first run, if it has one.
    pub formatting: Option<Formatting>,
    pub style: String,
}

/// Character formatting of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Formatting {
    pub font_name: Option<String>,
    /// Size in points.
    pub font_size: Option<f32>,
    /// `#rrggbb`, lowercase; `None` for automatic color.
    pub font_color: Option<String>,
    pub is_bold: bool,
    pub is_italic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRecord {
    pub index: usize,
    pub rows: Vec<Vec<CellRecord>>,
    pub has_shading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub text: String,
    pub has_shading: bool,
}

/// Snapshot of a word-processing package.
pub fn extract_docx(bytes: &[u8]) -> Result<Snapshot> {
    let package = Package::open(bytes)?;
    let dom = package.load_xml(package.main_part())?;
    let style_names = match package.styles_part() {
        Some(path) => style_names(&package.load_xml(path)?),
        None => HashMap::new(),
    };
    Ok(DocxExtractor::new(&dom, style_names).snapshot())
}

/// Snapshot of a markup document. Markup documents carry no tables.
pub fn extract_markup(source: &str) -> Snapshot {
    let dom = parse_html(source);
    let blocks = dom.find_all(dom.document(), |dom, id| {
        dom.local_name(id)
            .is_some_and(|l| MARKUP_BLOCKS.contains(&l.to_ascii_lowercase().as_str()))
    });
    let paragraphs = blocks
        .into_iter()
        .enumerate()
        .map(|(index, block)| ParagraphRecord {
            index,
            text: dom.text_content(block),
            has_image: dom
                .descendants(block)
                .any(|n| classify(&dom, n) == NodeClass::Image),
            formatting: None,
            style: dom.local_name(block).unwrap_or(DEFAULT_STYLE).to_string(),
        })
        .collect();
    Snapshot {
        paragraphs,
        tables: Vec::new(),
    }
}

/// Snapshot of plain text: blank-line separated blocks, trimmed, empty ones dropped.
pub fn extract_text(source: &str) -> Snapshot {
    let paragraphs = source
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(index, text)| ParagraphRecord {
            index,
            text: text.to_string(),
            has_image: false,
            formatting: None,
            style: DEFAULT_STYLE.to_string(),
        })
        .collect();
    Snapshot {
        paragraphs,
        tables: Vec::new(),
    }
}

/// Map style ids to display names from the styles part.
fn style_names(styles: &Dom) -> HashMap<String, String> {
    let names = WordNames::for_part(styles);
    styles
        .find_all(styles.document(), |dom, id| names.is(dom, id, "style"))
        .into_iter()
        .filter_map(|style| {
            let id = styles.attr(style, &names.q("styleId"))?;
            let name = names
                .child(styles, style, "name")
                .and_then(|n| styles.attr(n, &names.q("val")))?;
            Some((id.to_string(), name.to_string()))
        })
        .collect()
}

struct DocxExtractor<'a> {
    dom: &'a Dom,
    names: WordNames,
    style_names: HashMap<String, String>,
}

impl<'a> DocxExtractor<'a> {
    fn new(dom: &'a Dom, style_names: HashMap<String, String>) -> Self {
        Self {
            dom,
            names: WordNames::for_part(dom),
            style_names,
        }
    }

    fn snapshot(&self) -> Snapshot {
        let Some(body) = self
            .dom
            .root_element()
            .and_then(|root| self.names.child(self.dom, root, "body"))
        else {
            return Snapshot::default();
        };

        let names = &self.names;
        let paragraphs = self
            .dom
            .find_all(body, |dom, id| {
                names.is(dom, id, "p")
                    && !dom.ancestors(id).any(|a| {
                        names.is(dom, a, "tbl") || names.is(dom, a, "txbxContent")
                    })
            })
            .into_iter()
            .enumerate()
            .map(|(index, p)| self.paragraph(index, p))
            .collect();

        let tables = self
            .dom
            .find_all(body, |dom, id| {
                names.is(dom, id, "tbl") && names.ancestor(dom, id, "tbl").is_none()
            })
            .into_iter()
            .enumerate()
            .map(|(index, tbl)| self.table(index, tbl))
            .collect();

        Snapshot { paragraphs, tables }
    }

    fn paragraph(&self, index: usize, p: NodeId) -> ParagraphRecord {
        let style = self
            .names
            .child(self.dom, p, "pPr")
            .and_then(|ppr| self.names.child(self.dom, ppr, "pStyle"))
            .and_then(|s| self.dom.attr(s, &self.names.q("val")))
            .map(|id| self.style_names.get(id).map_or(id, String::as_str))
            .unwrap_or(DEFAULT_STYLE)
            .to_string();

        ParagraphRecord {
            index,
            text: self.paragraph_text(p),
            has_image: self
                .dom
                .descendants(p)
                .any(|n| classify(self.dom, n) == NodeClass::Image),
            formatting: self
                .contents(p, "r")
                .into_iter()
                .next()
                .map(|run| self.formatting(run)),
            style,
        }
    }

    /// Visible text of a paragraph, without text-box content.
    fn paragraph_text(&self, p: NodeId) -> String {
        let mut text = String::new();
        let mut stack: Vec<_> = self.dom.children(p).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            match self.dom.local_name(node) {
                Some("txbxContent" | "delText" | "instrText") => continue,
                Some("t") => text.push_str(&self.dom.text_content(node)),
                Some("tab") if self.in_run(node) => text.push('\t'),
                Some("br" | "cr") => text.push('\n'),
                _ => {}
            }
            if self.dom.local_name(node) != Some("t") {
                let start = stack.len();
                stack.extend(self.dom.children(node));
                stack[start..].reverse();
            }
        }
        text
    }

    /// Children named `local`, looking through content-control wrappers
    /// (`sdt` / `sdtContent`) the redactor will unwrap.
    fn contents(&self, parent: NodeId, local: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        for child in self.dom.children(parent) {
            if self.names.is(self.dom, child, local) {
                found.push(child);
            } else if self.names.is(self.dom, child, "sdt")
                && let Some(content) = self.names.child(self.dom, child, "sdtContent")
            {
                found.extend(self.contents(content, local));
            }
        }
        found
    }

    /// `w:tab` is both a run content character and a tab-stop definition.
    fn in_run(&self, node: NodeId) -> bool {
        self.dom
            .parent(node)
            .is_some_and(|parent| self.names.is(self.dom, parent, "r"))
    }

    fn formatting(&self, run: NodeId) -> Formatting {
        let Some(rpr) = self.names.child(self.dom, run, "rPr") else {
            return Formatting::default();
        };
        let val = |local: &str| {
            self.names
                .child(self.dom, rpr, local)
                .map(|node| self.dom.attr(node, &self.names.q("val")))
        };
        let toggle = |local: &str| match val(local) {
            Some(Some(v)) => !matches!(v, "0" | "false" | "off"),
            Some(None) => true,
            None => false,
        };

        Formatting {
            font_name: self
                .names
                .child(self.dom, rpr, "rFonts")
                .and_then(|f| self.dom.attr(f, &self.names.q("ascii")))
                .map(str::to_string),
            font_size: val("sz")
                .flatten()
                .and_then(|v| v.parse::<f32>().ok())
                .map(|half_points| half_points / 2.0),
            font_color: val("color")
                .flatten()
                .filter(|v| v.len() == 6 && v.chars().all(|c| c.is_ascii_hexdigit()))
                .map(|v| format!("#{}", v.to_ascii_lowercase())),
            is_bold: toggle("b"),
            is_italic: toggle("i"),
        }
    }

    fn table(&self, index: usize, tbl: NodeId) -> TableRecord {
        let rows: Vec<Vec<CellRecord>> = self
            .contents(tbl, "tr")
            .into_iter()
            .map(|row| {
                self.contents(row, "tc")
                    .into_iter()
                    .map(|cell| self.cell(cell))
                    .collect()
            })
            .collect();
        let has_shading = rows.iter().flatten().any(|c| c.has_shading);
        TableRecord {
            index,
            rows,
            has_shading,
        }
    }

    fn cell(&self, tc: NodeId) -> CellRecord {
        let text = self
            .contents(tc, "p")
            .into_iter()
            .map(|p| self.paragraph_text(p))
            .collect::<Vec<_>>()
            .join("\n");
        CellRecord {
            text,
            has_shading: self
                .dom
                .descendants(tc)
                .any(|n| classify(self.dom, n) == NodeClass::Shading),
        }
    }
}
