use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

const STORE_TMP_EXTENSION: &str = "json.tmp";
const ESSAY_ID_LEN: usize = 9;
const ESSAY_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// One saved essay. Field names on the wire stay Portuguese to match the
/// persisted format and the remote services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayRecord {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "texto")]
    pub body: String,
}

/// Owns the essay collection persisted as one JSON array in a single file.
///
/// The mutation unit is the whole collection: every write is a full
/// read → modify → rewrite. Two overlapping mutations would race and the
/// later write wins; all callers run on one user-triggered flow at a time.
#[derive(Clone)]
pub struct EssayStore {
    store_path: Arc<PathBuf>,
}

impl EssayStore {
    pub fn open(store_path: &Path) -> Self {
        Self {
            store_path: Arc::new(store_path.to_path_buf()),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Full collection in storage order (oldest first). A missing file or a
    /// value that fails to parse degrades to an empty collection.
    pub fn list_all(&self) -> Vec<EssayRecord> {
        match self.load_map() {
            Ok(map) => map.into_values().collect(),
            Err(err) => {
                tracing::warn!(?err, "reading essay store failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Display order: most recently appended first.
    pub fn list_recent_first(&self) -> Vec<EssayRecord> {
        let mut records = self.list_all();
        records.reverse();
        records
    }

    pub fn fetch(&self, id: &str) -> Result<Option<EssayRecord>> {
        Ok(self.load_map()?.get(id).cloned())
    }

    /// Appends one record and rewrites the collection. On a write failure the
    /// stored collection is left as it was.
    pub fn append(&self, record: EssayRecord) -> Result<()> {
        let mut map = self.load_map()?;
        map.insert(record.id.clone(), record);
        self.persist(&map)
    }

    /// Replaces the title and body of the matching entry, keeping collection
    /// length and order unchanged.
    pub fn update(&self, id: &str, title: &str, body: &str) -> Result<()> {
        let mut map = self.load_map()?;
        let Some(entry) = map.get_mut(id) else {
            bail!("essay {id} not found");
        };
        entry.title = title.to_string();
        entry.body = body.to_string();
        self.persist(&map)
    }

    /// Removes the matching entry. Returns `false` (collection untouched)
    /// when no entry has that id.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut map = self.load_map()?;
        if map.shift_remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&map)?;
        Ok(true)
    }

    /// Decodes the stored array into an insertion-ordered map keyed by id.
    /// Duplicate ids in a hand-edited file collapse to the last occurrence.
    fn load_map(&self) -> Result<IndexMap<String, EssayRecord>> {
        let raw = match fs::read_to_string(&*self.store_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(IndexMap::new());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("reading essay store {}", self.store_path.display())
                });
            }
        };

        let records: Vec<EssayRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    path = %self.store_path.display(),
                    %err,
                    "essay store is not valid JSON, treating as empty"
                );
                return Ok(IndexMap::new());
            }
        };

        let mut map = IndexMap::with_capacity(records.len());
        for record in records {
            map.insert(record.id.clone(), record);
        }
        Ok(map)
    }

    /// Serializes the whole collection and swaps it in via a temp file so a
    /// failed write never leaves a truncated store behind.
    fn persist(&self, map: &IndexMap<String, EssayRecord>) -> Result<()> {
        let records: Vec<&EssayRecord> = map.values().collect();
        let encoded = serde_json::to_string(&records).context("encoding essay collection")?;

        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let tmp_path = self.store_path.with_extension(STORE_TMP_EXTENSION);
        fs::write(&tmp_path, encoded)
            .with_context(|| format!("writing essay store {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &*self.store_path)
            .with_context(|| format!("replacing essay store {}", self.store_path.display()))?;
        Ok(())
    }
}

/// Client-generated essay id: 9 lowercase base-36 characters. Low entropy by
/// design, matching the ids already present in stored collections; collisions
/// are not detected.
pub fn new_essay_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ESSAY_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ESSAY_ID_ALPHABET.len());
            ESSAY_ID_ALPHABET[idx] as char
        })
        .collect()
}
