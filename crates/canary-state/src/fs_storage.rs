//! Filesystem object store
//!
//! Objects are JSON files written through a temp file and renamed into place,
//! so readers never see a partial write. Ids are checked before they touch a
//! path.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::{ObjectType, StorageResult, StorageService};

/// Filesystem-backed object store for a fixed set of accounts.
///
/// Layout: `<root>/<account>/<object type group>/<id>.json`
pub struct FsStorageService {
    root: PathBuf,
    accounts: Vec<String>,
}

impl FsStorageService {
    /// Create a store rooted at `root` serving `accounts`. Creates `root` if needed.
    pub fn new(root: impl AsRef<Path>, accounts: Vec<String>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, accounts })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn group_dir(&self, account_name: &str, object_type: ObjectType) -> PathBuf {
        self.root.join(account_name).join(object_type.group())
    }

    fn object_path(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
    ) -> StorageResult<PathBuf> {
        validate_id(id)?;
        Ok(self
            .group_dir(account_name, object_type)
            .join(format!("{id}.json")))
    }
}

/// Ids become file names, so path separators and dot-segments are rejected.
fn validate_id(id: &str) -> StorageResult<()> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0');
    if bad {
        return Err(StorageError::InvalidObjectId { id: id.to_string() });
    }
    Ok(())
}

#[async_trait]
impl StorageService for FsStorageService {
    fn services_account(&self, account_name: &str) -> bool {
        self.accounts.iter().any(|a| a == account_name)
    }

    async fn load_bytes(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
    ) -> StorageResult<Vec<u8>> {
        let path = self.object_path(account_name, object_type, id)?;
        debug!(path = %path.display(), "loading object");
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::ObjectNotFound {
                    account: account_name.to_string(),
                    object_type,
                    id: id.to_string(),
                }
            } else {
                StorageError::Io(e)
            }
        })
    }

    async fn store_bytes(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
        data: &[u8],
    ) -> StorageResult<()> {
        let path = self.object_path(account_name, object_type, id)?;
        let dir = self.group_dir(account_name, object_type);
        let data = data.to_vec();

        // Atomic write: temp file in the target directory, then rename.
        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&data)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
    }

    async fn list_ids(
        &self,
        account_name: &str,
        object_type: ObjectType,
    ) -> StorageResult<Vec<String>> {
        let dir = self.group_dir(account_name, object_type);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(id) = name.to_string_lossy().strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
