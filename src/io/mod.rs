//! Byte-level collaborators: the zip container and per-invocation scratch space.

mod container;
mod scratch;

pub use container::{Container, extract_container, rebuild_container};
pub use scratch::ScratchDir;
