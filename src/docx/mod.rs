//! Word-processing (OOXML) package model.

mod names;
mod package;
mod rels;

pub use names::WordNames;
pub use package::{ContentPart, Package, PartKind};
pub use rels::{
    Relationship, Relationships, part_dir, references_id, rels_path_for, resolve_target,
    source_part_for,
};
