//! Selective image removal.
//!
//! Assets are identified by the SHA-1 of their bytes, so a selection made on
//! one copy of a document still applies after it was repackaged. Removal
//! runs in three phases: embedding nodes are cut from every content part,
//! then relationship entries nothing references any more are dropped, and
//! only once those edits are written back are the asset files deleted.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::classify::{NodeClass, classify};
use crate::docx::{Relationships, references_id, source_part_for};
use crate::dom::{Dom, NodeId};
use crate::error::{Error, NodeError, Result};
use crate::io::Container;
use crate::util::detect_media_format;

/// Content hash of an embedded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHash([u8; 20]);

impl ImageHash {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

/// Hash an asset's raw bytes.
pub fn hash_asset(bytes: &[u8]) -> ImageHash {
    ImageHash(sha1_smol::Sha1::from(bytes).digest().bytes())
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidOptions(format!("invalid image hash {s:?}"));
        let s = s.trim();
        if s.len() != 40 || !s.is_ascii() {
            return Err(invalid());
        }
        let mut bytes = [0u8; 20];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(ImageHash(bytes))
    }
}

impl Serialize for ImageHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An embedded asset of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    pub path: String,
    pub hash: ImageHash,
    pub size: usize,
    pub media_type: &'static str,
}

/// Check whether a container path is an embedded asset.
pub fn is_asset_path(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    ["media/", "embeddings/"]
        .iter()
        .any(|dir| path.starts_with(dir) || path.contains(&format!("/{dir}")))
}

/// Hash every asset in the container, in archive order.
pub fn list_assets(container: &Container) -> Vec<ImageAsset> {
    container
        .paths()
        .filter(|p| is_asset_path(p))
        .filter_map(|path| {
            let data = container.get(path)?;
            Some(ImageAsset {
                path: path.to_string(),
                hash: hash_asset(data),
                size: data.len(),
                media_type: detect_media_format(path, data).mime_type(),
            })
        })
        .collect()
}

/// Paths of the assets to remove.
///
/// An empty or missing selection marks every asset.
pub fn resolve_selection(
    assets: &[ImageAsset],
    selection: Option<&HashSet<ImageHash>>,
) -> BTreeSet<String> {
    match selection {
        Some(hashes) if !hashes.is_empty() => assets
            .iter()
            .filter(|a| hashes.contains(&a.hash))
            .map(|a| a.path.clone())
            .collect(),
        _ => assets.iter().map(|a| a.path.clone()).collect(),
    }
}

/// Which embeddings the image pass removes from one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageFilter {
    /// Leave every embedding in place.
    #[default]
    Keep,
    /// Remove every embedding.
    All,
    /// Remove embeddings that reference one of these relationship ids.
    Referencing(HashSet<String>),
}

impl ImageFilter {
    /// Build the filter for one part.
    ///
    /// `remove_all` is set when no selection narrows the removal; otherwise
    /// only relationship ids targeting a marked asset are matched.
    pub fn for_part(
        rels: Option<&Relationships>,
        marked: &BTreeSet<String>,
        remove_all: bool,
    ) -> Self {
        if remove_all {
            return ImageFilter::All;
        }
        let ids = rels.map(|r| marked_ids(r, marked)).unwrap_or_default();
        if ids.is_empty() {
            ImageFilter::Keep
        } else {
            ImageFilter::Referencing(ids)
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, ImageFilter::Keep)
    }

    /// Check whether an embedding node is a removal target.
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        match self {
            ImageFilter::Keep => false,
            ImageFilter::All => true,
            ImageFilter::Referencing(ids) => {
                embedding_ids(dom, node).iter().any(|id| ids.contains(*id))
            }
        }
    }
}

/// Relationship ids in a table that target one of the marked assets.
pub fn marked_ids(rels: &Relationships, marked: &BTreeSet<String>) -> HashSet<String> {
    rels.entries()
        .into_iter()
        .filter(|r| rels.resolve(r).is_some_and(|t| marked.contains(&t)))
        .map(|r| r.id)
        .collect()
}

/// Relationship ids referenced by an embedding subtree.
///
/// Covers the three embedding mechanisms: DrawingML (`a:blip/@r:embed`,
/// `@r:link`), VML pictures (`v:imagedata/@r:id`) and OLE objects
/// (`o:OLEObject/@r:id`).
pub fn embedding_ids(dom: &Dom, node: NodeId) -> Vec<&str> {
    std::iter::once(node)
        .chain(dom.descendants(node))
        .flat_map(|n| dom.attrs(n).iter())
        .filter(|a| {
            a.prefix().is_some() && matches!(a.local_name(), "embed" | "link" | "id" | "pict")
        })
        .map(|a| a.value.as_str())
        .collect()
}

/// Check whether a node is an embedding not nested in another embedding.
pub fn is_outermost_embedding(dom: &Dom, node: NodeId) -> bool {
    classify(dom, node) == NodeClass::Image
        && !dom
            .ancestors(node)
            .any(|a| classify(dom, a) == NodeClass::Image)
}

/// Drop relationship entries for `ids` that the part no longer references.
///
/// Returns the number of entries removed.
pub fn clean_relationships<'a>(
    dom: &Dom,
    rels: &mut Relationships,
    ids: impl IntoIterator<Item = &'a String>,
) -> std::result::Result<usize, NodeError> {
    let mut removed = 0;
    for id in ids {
        if !references_id(dom, id) && rels.remove(id)? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Delete marked assets that no relationship table in the container still
/// targets. Must run after every structural edit was written back.
pub fn delete_unreferenced_assets(
    container: &mut Container,
    marked: &BTreeSet<String>,
) -> Result<usize> {
    let mut referenced = HashSet::new();
    let rels_paths: Vec<String> = container
        .paths()
        .filter(|p| p.ends_with(".rels"))
        .map(str::to_string)
        .collect();
    for rels_path in rels_paths {
        let Some(source) = source_part_for(&rels_path) else {
            continue;
        };
        let Some(bytes) = container.get(&rels_path) else {
            continue;
        };
        let rels = Relationships::parse(&rels_path, &source, bytes)?;
        for rel in rels.entries() {
            if let Some(target) = rels.resolve(&rel) {
                referenced.insert(target);
            }
        }
    }

    let mut deleted = 0;
    for path in marked {
        if referenced.contains(path) {
            tracing::debug!(%path, "asset still referenced, kept");
            continue;
        }
        if container.remove(path) {
            deleted += 1;
        }
    }
    Ok(deleted)
}
