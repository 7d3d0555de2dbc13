//! Word-processing package: part discovery and part I/O.

use crate::dom::{Dom, parse_xml, write_xml};
use crate::error::{Error, Result};
use crate::io::Container;
use crate::util::decode_xml;

use super::rels::{Relationships, part_dir, rels_path_for};

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Role of a content-bearing part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    MainDocument,
    Header,
    Footer,
    Footnotes,
    Endnotes,
}

impl PartKind {
    /// Map a relationship kind (`header`, `footer`, ...) to a part role.
    fn from_rel_kind(kind: &str) -> Option<Self> {
        match kind {
            "header" => Some(PartKind::Header),
            "footer" => Some(PartKind::Footer),
            "footnotes" => Some(PartKind::Footnotes),
            "endnotes" => Some(PartKind::Endnotes),
            _ => None,
        }
    }

    fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".xml")?;
        if stem.starts_with("header") {
            Some(PartKind::Header)
        } else if stem.starts_with("footer") {
            Some(PartKind::Footer)
        } else if stem == "footnotes" {
            Some(PartKind::Footnotes)
        } else if stem == "endnotes" {
            Some(PartKind::Endnotes)
        } else {
            None
        }
    }
}

/// A content part to redact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPart {
    pub path: String,
    pub kind: PartKind,
}

/// An unpacked word-processing package with its parts located.
#[derive(Debug, Clone)]
pub struct Package {
    container: Container,
    main: String,
    content_parts: Vec<ContentPart>,
    styles: Option<String>,
    themes: Vec<String>,
}

impl Package {
    /// Unpack and index a package.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        Self::from_container(Container::from_bytes(bytes.to_vec())?)
    }

    /// Index the parts of an unpacked container.
    pub fn from_container(container: Container) -> Result<Self> {
        let main = find_main_part(&container)?;

        let mut content_parts = vec![ContentPart {
            path: main.clone(),
            kind: PartKind::MainDocument,
        }];
        let mut styles = None;
        let mut themes = Vec::new();

        let main_rels_path = rels_path_for(&main);
        match container.get(&main_rels_path) {
            Some(bytes) => {
                let rels = Relationships::parse(&main_rels_path, &main, bytes)?;
                for rel in rels.entries() {
                    let Some(target) = rels.resolve(&rel) else {
                        continue;
                    };
                    if !container.contains(&target) {
                        tracing::debug!(id = %rel.id, %target, "relationship target missing");
                        continue;
                    }
                    match rel.kind() {
                        "styles" => styles = Some(target),
                        "theme" => themes.push(target),
                        kind => {
                            if let Some(kind) = PartKind::from_rel_kind(kind)
                                && !content_parts.iter().any(|p| p.path == target)
                            {
                                content_parts.push(ContentPart { path: target, kind });
                            }
                        }
                    }
                }
            }
            None => {
                // No relationship table: fall back to conventional names.
                let dir = part_dir(&main).to_string();
                for path in container.paths() {
                    let Some(name) = path.strip_prefix(&dir).and_then(|p| p.strip_prefix('/'))
                    else {
                        continue;
                    };
                    if name == "styles.xml" {
                        styles = Some(path.to_string());
                    } else if name.starts_with("theme/") && name.ends_with(".xml") {
                        themes.push(path.to_string());
                    } else if !name.contains('/')
                        && let Some(kind) = PartKind::from_file_name(name)
                    {
                        content_parts.push(ContentPart {
                            path: path.to_string(),
                            kind,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            main = %main,
            parts = content_parts.len(),
            themes = themes.len(),
            "indexed package"
        );
        Ok(Self {
            container,
            main,
            content_parts,
            styles,
            themes,
        })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Path of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main
    }

    /// Main document, headers, footers and notes, main document first.
    pub fn content_parts(&self) -> &[ContentPart] {
        &self.content_parts
    }

    pub fn styles_part(&self) -> Option<&str> {
        self.styles.as_deref()
    }

    pub fn theme_parts(&self) -> &[String] {
        &self.themes
    }

    /// Parse an XML part.
    pub fn load_xml(&self, path: &str) -> Result<Dom> {
        let bytes = self
            .container
            .get(path)
            .ok_or_else(|| Error::ContainerCorrupt(format!("missing part {path}")))?;
        parse_xml(&decode_xml(bytes))
    }

    /// Parse the relationship table of a part, if it has one.
    pub fn load_rels(&self, part: &str) -> Result<Option<Relationships>> {
        let path = rels_path_for(part);
        match self.container.get(&path) {
            Some(bytes) => Ok(Some(Relationships::parse(&path, part, bytes)?)),
            None => Ok(None),
        }
    }

    /// Write a part back if its tree changed. Returns whether it was written.
    pub fn store_xml(&mut self, path: &str, dom: &Dom) -> bool {
        if !dom.is_modified() {
            return false;
        }
        self.container.put(path, write_xml(dom).into_bytes());
        true
    }

    /// Write a relationship table back if it changed.
    pub fn store_rels(&mut self, rels: &Relationships) -> bool {
        if !rels.is_modified() {
            return false;
        }
        self.container.put(rels.path(), rels.to_bytes());
        true
    }

    /// Repack the package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.container.rebuild()
    }
}

/// Locate the main document part via the package relationships.
fn find_main_part(container: &Container) -> Result<String> {
    const PACKAGE_RELS: &str = "_rels/.rels";

    if let Some(bytes) = container.get(PACKAGE_RELS) {
        let rels = Relationships::parse(PACKAGE_RELS, "", bytes)?;
        if let Some(target) = rels
            .of_kind("officeDocument")
            .filter_map(|r| rels.resolve(&r))
            .find(|t| container.contains(t))
        {
            return Ok(target);
        }
    }

    if container.contains(DEFAULT_MAIN_PART) {
        return Ok(DEFAULT_MAIN_PART.to_string());
    }

    Err(Error::UnsupportedFormat(
        "archive has no word-processing main document part".to_string(),
    ))
}
