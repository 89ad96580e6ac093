//! Sharded on-disk chunk directory
//!
//! Chunks are content-addressed files laid out as `<root>/<hash[0..2]>/<hash>`.
//! The two-character shard level bounds per-directory fanout. Both the
//! coordinator's dedup index and each storage node persist chunks through
//! this type.

use crate::error::{Result, StoreError};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns true if `name` looks like a chunk file name (64 lowercase hex chars)
pub fn is_chunk_hash(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A sharded chunk directory rooted at a base path
#[derive(Debug, Clone)]
pub struct ChunkDir {
    root: PathBuf,
}

impl ChunkDir {
    /// Open (creating if needed) a chunk directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root path of this directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path for a chunk hash
    pub fn path_for(&self, hash: &str) -> Result<PathBuf> {
        if !is_chunk_hash(hash) {
            return Err(StoreError::InvalidHash(hash.to_string()));
        }
        Ok(self.root.join(&hash[..2]).join(hash))
    }

    /// Persist chunk bytes; idempotent on repeat
    pub fn write(&self, hash: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(hash)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Read chunk bytes
    pub fn read(&self, hash: &str) -> Result<Vec<u8>> {
        let path = self.path_for(hash)?;
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::ChunkNotFound(hash.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a chunk file exists
    pub fn contains(&self, hash: &str) -> bool {
        self.path_for(hash).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Delete a chunk file
    pub fn remove(&self, hash: &str) -> Result<()> {
        let path = self.path_for(hash)?;
        fs::remove_file(&path)?;
        Ok(())
    }

    /// Walk the directory and collect held chunk hashes
    ///
    /// Admits any file whose name is 64 hex characters; used to recover a
    /// node's held set after restart.
    pub fn scan(&self) -> Result<Vec<String>> {
        let mut hashes = Vec::new();

        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let name = entry.file_name();
                if let Some(name) = name.to_str() {
                    if is_chunk_hash(name) {
                        hashes.push(name.to_string());
                    }
                }
            }
        }

        Ok(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::ContentHash;
    use tempfile::TempDir;

    fn hash_of(data: &[u8]) -> String {
        ContentHash::compute(data).to_hex()
    }

    #[test]
    fn test_write_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let dir = ChunkDir::open(tmp.path()).unwrap();

        let data = b"chunk contents";
        let hash = hash_of(data);

        let path = dir.write(&hash, data).unwrap();
        assert!(path.ends_with(format!("{}/{}", &hash[..2], hash)));
        assert!(dir.contains(&hash));

        let read = dir.read(&hash).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn test_write_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = ChunkDir::open(tmp.path()).unwrap();

        let data = b"same bytes";
        let hash = hash_of(data);

        dir.write(&hash, data).unwrap();
        dir.write(&hash, data).unwrap();

        assert_eq!(dir.read(&hash).unwrap(), data);
        assert_eq!(dir.scan().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_chunk_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let dir = ChunkDir::open(tmp.path()).unwrap();

        let hash = hash_of(b"never stored");
        let result = dir.read(&hash);
        assert!(matches!(result, Err(StoreError::ChunkNotFound(_))));
    }

    #[test]
    fn test_rejects_bad_hash() {
        let tmp = TempDir::new().unwrap();
        let dir = ChunkDir::open(tmp.path()).unwrap();

        assert!(matches!(
            dir.write("../escape", b"x"),
            Err(StoreError::InvalidHash(_))
        ));
        assert!(matches!(
            dir.read("deadbeef"),
            Err(StoreError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_scan_recovers_chunks() {
        let tmp = TempDir::new().unwrap();
        let dir = ChunkDir::open(tmp.path()).unwrap();

        let hashes: Vec<String> = (0..5u8)
            .map(|i| {
                let data = vec![i; 100];
                let hash = hash_of(&data);
                dir.write(&hash, &data).unwrap();
                hash
            })
            .collect();

        // A stray non-chunk file is ignored
        std::fs::write(tmp.path().join("notes.txt"), b"ignore me").unwrap();

        let reopened = ChunkDir::open(tmp.path()).unwrap();
        let mut scanned = reopened.scan().unwrap();
        scanned.sort();
        let mut expected = hashes;
        expected.sort();
        assert_eq!(scanned, expected);
    }

    #[test]
    fn test_remove_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let dir = ChunkDir::open(tmp.path()).unwrap();

        let data = b"to be removed";
        let hash = hash_of(data);
        dir.write(&hash, data).unwrap();
        dir.remove(&hash).unwrap();

        assert!(!dir.contains(&hash));
    }
}
