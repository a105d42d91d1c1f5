/// Durable catalogue storage with backup-before-overwrite
use super::{Catalogue, ChannelInfo};
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Suffix appended to the primary file name for the one-generation backup
pub const BACKUP_SUFFIX: &str = ".backup";

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("failed to read catalogue {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalogue {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalogue: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no backup found at {}", .0.display())]
    MissingBackup(PathBuf),
}

/// Reads and replaces the catalogue file.
///
/// Single writer is assumed; there is no locking. Every save copies the
/// current file to `<path>.backup` first and then renames a fully written
/// temporary file over the primary, so a reader never sees a partial file.
#[derive(Debug, Clone)]
pub struct CatalogueStore {
    path: PathBuf,
    backup_path: PathBuf,
    placeholder: ChannelInfo,
}

impl CatalogueStore {
    pub fn new(path: impl Into<PathBuf>, placeholder: ChannelInfo) -> Self {
        let path = path.into();
        let mut backup = path.clone().into_os_string();
        backup.push(BACKUP_SUFFIX);

        Self {
            path,
            backup_path: PathBuf::from(backup),
            placeholder,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Load the catalogue. A missing file is a fresh, empty catalogue; a file
    /// that exists but cannot be read or parsed is an error.
    pub fn load(&self) -> Result<Catalogue, CatalogueError> {
        if !self.path.exists() {
            info!("📭 No catalogue at {}, starting empty", self.path.display());
            return Ok(Catalogue::empty(self.placeholder.clone()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| CatalogueError::Read {
            path: self.path.clone(),
            source,
        })?;

        let catalogue: Catalogue =
            serde_json::from_str(&content).map_err(|source| CatalogueError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        info!("📚 Loaded {} videos from {}", catalogue.len(), self.path.display());
        Ok(catalogue)
    }

    /// Replace the stored catalogue. Stamps `last_updated` and `total_videos`.
    pub fn save(&self, catalogue: &mut Catalogue) -> Result<(), CatalogueError> {
        catalogue.channel_info.last_updated = Some(Utc::now());
        catalogue.channel_info.total_videos = catalogue.videos.len();

        let json_content =
            serde_json::to_string_pretty(catalogue).map_err(CatalogueError::Serialize)?;

        let dir = self.parent_dir();
        std::fs::create_dir_all(dir).map_err(|source| self.write_error(dir, source))?;

        self.create_backup()?;
        self.write_atomically(json_content.as_bytes())?;

        info!("💾 Saved {} videos to {}", catalogue.len(), self.path.display());
        Ok(())
    }

    /// Copy the current file to the backup path, replacing any older backup.
    /// Returns whether there was anything to back up.
    pub fn create_backup(&self) -> Result<bool, CatalogueError> {
        if !self.path.exists() {
            return Ok(false);
        }

        std::fs::copy(&self.path, &self.backup_path)
            .map_err(|source| self.write_error(&self.backup_path, source))?;
        info!("🗄️ Created backup: {}", self.backup_path.display());
        Ok(true)
    }

    /// Put the backup back in place of the primary file
    pub fn restore_backup(&self) -> Result<(), CatalogueError> {
        if !self.backup_path.exists() {
            return Err(CatalogueError::MissingBackup(self.backup_path.clone()));
        }

        let content = std::fs::read(&self.backup_path).map_err(|source| CatalogueError::Read {
            path: self.backup_path.clone(),
            source,
        })?;
        self.write_atomically(&content)?;
        info!("♻️ Restored {} from {}", self.path.display(), self.backup_path.display());
        Ok(())
    }

    /// Write `bytes` to a temporary file beside the primary and rename it
    /// into place
    fn write_atomically(&self, bytes: &[u8]) -> Result<(), CatalogueError> {
        let dir = self.parent_dir();
        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| self.write_error(dir, source))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|source| self.write_error(tmp.path(), source))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(&self.path, e.error))?;
        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write_error(&self, path: &Path, source: std::io::Error) -> CatalogueError {
        debug!("Write failure on {}: {}", path.display(), source);
        CatalogueError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::VideoRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_in(dir: &TempDir) -> CatalogueStore {
        CatalogueStore::new(
            dir.path().join("data").join("videos.json"),
            ChannelInfo::placeholder("Chan", "@chan"),
        )
    }

    fn catalogue_with(ids: &[&str]) -> Catalogue {
        let records = ids.iter().map(|id| {
            VideoRecord::new(*id, format!("title {}", id), ymd(2020, 1, 1), Some(ymd(2019, 1, 4)))
        });
        Catalogue::from_records(ChannelInfo::placeholder("Chan", "@chan"), records).0
    }

    #[test]
    fn test_load_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let catalogue = store.load().unwrap();
        assert!(catalogue.is_empty());
        assert_eq!(catalogue.channel_info.channel_handle, "@chan");
        assert!(catalogue.channel_info.last_updated.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let mut catalogue = catalogue_with(&["a", "b", "c"]);

        store.save(&mut catalogue).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.videos, catalogue.videos);
        assert!(loaded.channel_info.last_updated.is_some());
        assert_eq!(loaded.channel_info.total_videos, 3);
    }

    #[test]
    fn test_backup_holds_previous_generation_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.save(&mut catalogue_with(&["a"])).unwrap();
        assert!(!store.backup_path().exists());

        store.save(&mut catalogue_with(&["a", "b"])).unwrap();
        store.save(&mut catalogue_with(&["a", "b", "c"])).unwrap();

        let backup: Catalogue =
            serde_json::from_str(&std::fs::read_to_string(store.backup_path()).unwrap()).unwrap();
        assert_eq!(backup.len(), 2);
        assert_eq!(store.load().unwrap().len(), 3);
    }

    #[test]
    fn test_backup_path_suffix() {
        let store = CatalogueStore::new("data/videos.json", ChannelInfo::placeholder("C", "@c"));
        assert_eq!(store.backup_path(), Path::new("data/videos.json.backup"));
    }

    #[test]
    fn test_corrupt_file_is_fatal_and_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{\"channel_info\": {").unwrap();

        assert!(matches!(store.load(), Err(CatalogueError::Corrupt { .. })));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{\"channel_info\": {");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.save(&mut catalogue_with(&["a"])).unwrap();
        store.save(&mut catalogue_with(&["b"])).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["videos.json".to_string(), "videos.json.backup".to_string()]);
    }

    #[test]
    fn test_restore_backup() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        assert!(matches!(store.restore_backup(), Err(CatalogueError::MissingBackup(_))));

        store.save(&mut catalogue_with(&["a"])).unwrap();
        store.save(&mut catalogue_with(&["a", "b"])).unwrap();
        store.restore_backup().unwrap();

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_restore_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.save(&mut catalogue_with(&["a"])).unwrap();
        store.save(&mut catalogue_with(&["a", "b"])).unwrap();

        store.restore_backup().unwrap();

        let mut names: Vec<String> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["videos.json".to_string(), "videos.json.backup".to_string()]);
        assert_eq!(
            std::fs::read(store.path()).unwrap(),
            std::fs::read(store.backup_path()).unwrap()
        );
    }
}
