//! Keyed blob storage for numbered chunks.
//!
//! Both the unclassified input and the classified output live behind
//! [`ChunkStore`], so resume logic only ever sees integer keys. The
//! filesystem backend keeps the `{dir}/{index}.json` layout analysts are
//! used to inspecting by hand.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{PipelineError, PipelineResult};

/// Storage seam for numbered chunk blobs.
pub trait ChunkStore: Send + Sync {
    /// Every stored key, ascending.
    fn indices(&self) -> PipelineResult<Vec<usize>>;

    fn read(&self, index: usize) -> PipelineResult<Vec<u8>>;

    fn write(&self, index: usize, bytes: &[u8]) -> PipelineResult<()>;

    /// Remove every stored chunk, returning how many were dropped.
    fn clear(&self) -> PipelineResult<usize>;

    /// Human-readable location of a key, used in problem reports.
    fn locate(&self, index: usize) -> String;

    /// One past the highest stored key, or zero when empty.
    fn next_index(&self) -> PipelineResult<usize> {
        Ok(self
            .indices()?
            .into_iter()
            .max()
            .map(|max| max + 1)
            .unwrap_or(0))
    }
}

/// Serialise `value` with four-space indentation and store it under `index`.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn ChunkStore,
    index: usize,
    value: &T,
) -> PipelineResult<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    store.write(index, &buf)
}

/// Mark `index` as processed without any content.
pub fn write_tombstone(store: &dyn ChunkStore, index: usize) -> PipelineResult<()> {
    store.write(index, &[])
}

/// Chunk directory on local disk.
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    dir: PathBuf,
}

impl FsChunkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{index}.json"))
    }

    fn entries(&self) -> PipelineResult<Vec<(usize, PathBuf)>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|err| PipelineError::Store(err.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|s| s.to_str()) != Some("json")
            {
                continue;
            }
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<usize>().ok())
            {
                Some(index) => entries.push((index, path.to_path_buf())),
                None => warn!(path = %path.display(), "ignoring non-numeric chunk file"),
            }
        }
        entries.sort_by_key(|(index, _)| *index);
        Ok(entries)
    }
}

impl ChunkStore for FsChunkStore {
    fn indices(&self) -> PipelineResult<Vec<usize>> {
        Ok(self.entries()?.into_iter().map(|(index, _)| index).collect())
    }

    fn read(&self, index: usize) -> PipelineResult<Vec<u8>> {
        Ok(fs::read(self.path_for(index))?)
    }

    fn write(&self, index: usize, bytes: &[u8]) -> PipelineResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(index), bytes)?;
        Ok(())
    }

    fn clear(&self) -> PipelineResult<usize> {
        let entries = self.entries()?;
        for (_, path) in &entries {
            fs::remove_file(path)?;
        }
        debug!(dir = %self.dir.display(), removed = entries.len(), "cleared chunk dir");
        Ok(entries.len())
    }

    fn locate(&self, index: usize) -> String {
        self.path_for(index).display().to_string()
    }
}

/// Process-local store, handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    blobs: RwLock<BTreeMap<usize, Vec<u8>>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> PipelineError {
    PipelineError::Store("memory store lock poisoned".into())
}

impl ChunkStore for MemoryChunkStore {
    fn indices(&self) -> PipelineResult<Vec<usize>> {
        Ok(self.blobs.read().map_err(poisoned)?.keys().copied().collect())
    }

    fn read(&self, index: usize) -> PipelineResult<Vec<u8>> {
        self.blobs
            .read()
            .map_err(poisoned)?
            .get(&index)
            .cloned()
            .ok_or_else(|| PipelineError::Store(format!("chunk {index} not found")))
    }

    fn write(&self, index: usize, bytes: &[u8]) -> PipelineResult<()> {
        self.blobs
            .write()
            .map_err(poisoned)?
            .insert(index, bytes.to_vec());
        Ok(())
    }

    fn clear(&self) -> PipelineResult<usize> {
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        let removed = blobs.len();
        blobs.clear();
        Ok(removed)
    }

    fn locate(&self, index: usize) -> String {
        format!("memory://{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_index_follows_highest_key() {
        let store = MemoryChunkStore::new();
        assert_eq!(store.next_index().unwrap(), 0);
        store.write(0, b"[]").unwrap();
        store.write(4, b"[]").unwrap();
        assert_eq!(store.next_index().unwrap(), 5);
    }

    #[test]
    fn fs_store_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsChunkStore::new(dir.path());
        store.write(2, b"[]").unwrap();
        fs::write(dir.path().join("notes.json"), b"{}").unwrap();
        fs::write(dir.path().join("3.txt"), b"x").unwrap();
        assert_eq!(store.indices().unwrap(), vec![2]);
        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.indices().unwrap().is_empty());
    }

    #[test]
    fn json_uses_four_space_indent() {
        let store = MemoryChunkStore::new();
        write_json(&store, 0, &vec![1]).unwrap();
        assert_eq!(store.read(0).unwrap(), b"[\n    1\n]");
    }
}
