use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// One entry of the archive, in archive order.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    /// Index in the source archive, if the entry came from it.
    origin: Option<usize>,
    compression: CompressionMethod,
    is_dir: bool,
    modified: bool,
    removed: bool,
}

/// An unpacked zip container: ordered `path -> bytes` with change tracking.
///
/// Untouched entries are copied raw from the source archive on rebuild, so
/// their compressed bytes survive unchanged. When nothing was touched at all,
/// [`Container::rebuild`] hands back the source bytes verbatim.
#[derive(Debug, Clone)]
pub struct Container {
    source: Vec<u8>,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

/// Unpack a container from its bytes.
pub fn extract_container(bytes: &[u8]) -> Result<Container> {
    Container::from_bytes(bytes.to_vec())
}

/// Repack a container into bytes.
pub fn rebuild_container(container: &Container) -> Result<Vec<u8>> {
    container.rebuild()
}

impl Container {
    /// Unpack every entry of the archive held in `source`.
    pub fn from_bytes(source: Vec<u8>) -> Result<Self> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        {
            let mut archive = ZipArchive::new(Cursor::new(source.as_slice()))
                .map_err(|e| Error::ContainerCorrupt(e.to_string()))?;

            for i in 0..archive.len() {
                let mut file = archive
                    .by_index(i)
                    .map_err(|e| Error::ContainerCorrupt(format!("entry #{i}: {e}")))?;
                let name = file.name().to_string();
                let is_dir = file.is_dir();
                let compression = file.compression();
                let mut data = Vec::with_capacity(file.size() as usize);
                if !is_dir {
                    file.read_to_end(&mut data)
                        .map_err(|e| Error::ContainerCorrupt(format!("{name}: {e}")))?;
                }

                index.insert(name.clone(), entries.len());
                entries.push(Entry {
                    name,
                    data,
                    origin: Some(i),
                    compression,
                    is_dir,
                    modified: false,
                    removed: false,
                });
            }
        }

        tracing::debug!(entries = entries.len(), "unpacked container");
        Ok(Self {
            source,
            entries,
            index,
        })
    }

    /// Get the bytes of an entry.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.live(path).map(|e| e.data.as_slice())
    }

    /// Check whether an entry exists.
    pub fn contains(&self, path: &str) -> bool {
        self.live(path).is_some()
    }

    /// Paths of all live file entries, in archive order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.removed && !e.is_dir)
            .map(|e| e.name.as_str())
    }

    /// Number of live file entries.
    pub fn len(&self) -> usize {
        self.paths().count()
    }

    /// Check whether the container holds no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace (or add) an entry.
    pub fn put(&mut self, path: &str, data: Vec<u8>) {
        match self.index.get(path) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.data = data;
                entry.modified = true;
                entry.removed = false;
            }
            None => {
                self.index.insert(path.to_string(), self.entries.len());
                self.entries.push(Entry {
                    name: path.to_string(),
                    data,
                    origin: None,
                    compression: CompressionMethod::Deflated,
                    is_dir: false,
                    modified: true,
                    removed: false,
                });
            }
        }
    }

    /// Remove an entry. Returns `true` if it existed.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.index.get(path) {
            Some(&i) if !self.entries[i].removed => {
                let entry = &mut self.entries[i];
                entry.removed = true;
                entry.data = Vec::new();
                true
            }
            _ => false,
        }
    }

    /// Check whether any entry was written or removed since unpacking.
    pub fn is_modified(&self) -> bool {
        self.entries.iter().any(|e| e.modified || e.removed)
    }

    /// Repack the container.
    pub fn rebuild(&self) -> Result<Vec<u8>> {
        if !self.is_modified() && !self.source.is_empty() {
            return Ok(self.source.clone());
        }

        let mut original = if self.source.is_empty() {
            None
        } else {
            Some(ZipArchive::new(Cursor::new(self.source.as_slice()))?)
        };

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in self.entries.iter().filter(|e| !e.removed) {
            if let (false, Some(i), Some(archive)) = (entry.modified, entry.origin, original.as_mut())
            {
                let file = archive.by_index_raw(i)?;
                zip.raw_copy_file(file)?;
                continue;
            }

            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn live(&self, path: &str) -> Option<&Entry> {
        self.index
            .get(path)
            .map(|&i| &self.entries[i])
            .filter(|e| !e.removed && !e.is_dir)
    }
}
