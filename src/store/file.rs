//! # Local Filesystem Store
//!
//! One JSON file per record. Each file is an envelope carrying the record
//! body and a CRC32 of that body; every read validates the checksum and a
//! mismatch is reported as `Corrupted`, never silently skipped.
//!
//! File names are the hex SHA-256 of the primary key, so keys of any length
//! may contain separators and path characters. The envelope keeps the full
//! key and every point read checks it.

use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::backend::{KeyValueStore, StoredRecord};
use super::errors::{StorageError, StoreResult};

const EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    key: String,
    checksum: u32,
    body: String,
}

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Fixed-length file stem for `key`
fn encode_key(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Filesystem-backed key-value store
#[derive(Debug)]
pub struct FileStore<R> {
    root: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> FileStore<R>
where
    R: StoredRecord + Serialize + DeserializeOwned,
{
    /// Opens a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            _record: PhantomData,
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", encode_key(key), EXTENSION))
    }

    fn read_file(&self, path: &Path, expected_key: Option<&str>) -> StoreResult<R> {
        let raw = fs::read(path)?;
        let envelope: Envelope = serde_json::from_slice(&raw).map_err(|e| {
            StorageError::corrupted(path.display().to_string(), format!("unreadable envelope: {}", e))
        })?;

        if let Some(expected) = expected_key {
            if envelope.key != expected {
                return Err(StorageError::corrupted(
                    expected,
                    format!("file holds key '{}'", envelope.key),
                ));
            }
        }

        if compute_checksum(envelope.body.as_bytes()) != envelope.checksum {
            return Err(StorageError::corrupted(envelope.key, "checksum mismatch"));
        }

        let record: R = serde_json::from_str(&envelope.body)?;
        Ok(record)
    }
}

impl<R> KeyValueStore<R> for FileStore<R>
where
    R: StoredRecord + Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> StoreResult<Option<R>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        self.read_file(&path, Some(key)).map(Some)
    }

    fn put(&self, record: R) -> StoreResult<()> {
        let body = serde_json::to_string(&record)?;
        let envelope = Envelope {
            key: record.key().to_string(),
            checksum: compute_checksum(body.as_bytes()),
            body,
        };

        // Write-then-rename so a reader never sees a half-written record
        let path = self.path_for(record.key());
        let tmp = path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&serde_json::to_vec(&envelope)?)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn scan(&self) -> StoreResult<Vec<R>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            records.push(self.read_file(&path, None)?);
        }
        records.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(records)
    }
}
