//! Relationship tables (`*.rels` parts).

use std::borrow::Cow;

use crate::dom::{Dom, NodeId, parse_xml, write_xml};
use crate::error::{NodeError, Result};
use crate::util::decode_xml;

/// One `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Last segment of the relationship type URI (`image`, `header`, `oleObject`, ...).
    pub fn kind(&self) -> &str {
        self.rel_type.rsplit('/').next().unwrap_or(&self.rel_type)
    }
}

/// A parsed relationship table belonging to one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    path: String,
    base_dir: String,
    dom: Dom,
}

impl Relationships {
    /// Parse the relationship table at `path`, which belongs to `source_part`.
    pub fn parse(path: &str, source_part: &str, bytes: &[u8]) -> Result<Self> {
        let dom = parse_xml(&decode_xml(bytes))?;
        Ok(Self {
            path: path.to_string(),
            base_dir: part_dir(source_part).to_string(),
            dom,
        })
    }

    /// Container path of the table itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.dom.find_local(self.dom.document(), "Relationship")
    }

    fn record(&self, node: NodeId) -> Option<Relationship> {
        let id = self.dom.attr(node, "Id")?;
        Some(Relationship {
            id: id.to_string(),
            rel_type: self.dom.attr(node, "Type").unwrap_or_default().to_string(),
            target: self.dom.attr(node, "Target").unwrap_or_default().to_string(),
            external: self
                .dom
                .attr(node, "TargetMode")
                .is_some_and(|m| m.eq_ignore_ascii_case("External")),
        })
    }

    /// All entries, in table order.
    pub fn entries(&self) -> Vec<Relationship> {
        self.nodes().into_iter().filter_map(|n| self.record(n)).collect()
    }

    /// Entries whose type URI ends in `/{kind}`.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = Relationship> + 'a {
        self.entries().into_iter().filter(move |r| r.kind() == kind)
    }

    /// Container path an internal relationship points to.
    pub fn resolve(&self, rel: &Relationship) -> Option<String> {
        if rel.external {
            return None;
        }
        Some(resolve_target(&self.base_dir, &rel.target))
    }

    /// Remove an entry by id.
    pub fn remove(&mut self, id: &str) -> std::result::Result<bool, NodeError> {
        let node = self
            .nodes()
            .into_iter()
            .find(|&n| self.dom.attr(n, "Id") == Some(id));
        match node {
            Some(n) => self.dom.detach(n).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.dom.is_modified()
    }

    /// Serialize the table.
    pub fn to_bytes(&self) -> Vec<u8> {
        write_xml(&self.dom).into_bytes()
    }
}

/// Directory of a part path (`word/document.xml` -> `word`).
pub fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Relationship table path for a part (`word/document.xml` -> `word/_rels/document.xml.rels`).
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, name)) => format!("{dir}/_rels/{name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Source part of a relationship table (`word/_rels/document.xml.rels` -> `word/document.xml`).
pub fn source_part_for(rels_path: &str) -> Option<String> {
    let name = rels_path.strip_suffix(".rels")?;
    let (dir, file) = name.rsplit_once('/').unwrap_or(("", name));
    let dir = dir.strip_suffix("_rels")?.trim_end_matches('/');
    Some(if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    })
}

/// Check whether any namespaced attribute in the tree carries `id`.
///
/// Relationship references are always prefixed (`r:id`, `r:embed`, ...);
/// unprefixed attributes such as `wp:docPr/@id` are numeric ids of another kind.
pub fn references_id(dom: &Dom, id: &str) -> bool {
    dom.descendants(dom.document()).any(|node| {
        dom.attrs(node)
            .iter()
            .any(|a| a.prefix().is_some() && a.value == id)
    })
}

/// Resolve a relationship target against the source part's directory.
///
/// Handles absolute targets (`/word/media/a.png`), `..` segments and
/// percent-encoded names.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let target: Cow<'_, str> = percent_encoding::percent_decode_str(target)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(target));

    let (mut segments, rest): (Vec<&str>, &str) = match target.strip_prefix('/') {
        Some(absolute) => (Vec::new(), absolute),
        None => (
            base_dir.split('/').filter(|s| !s.is_empty()).collect(),
            &target[..],
        ),
    };

    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
