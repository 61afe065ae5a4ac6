//! Local storage for downloaded structure files
//!
//! Files are stored flat in the fetch directory as `{id}-AF-v{version}.{ext}`.
//! An existing file for an identifier short-circuits the network probe.

use crate::error::Result;
use afetch_common::checksum::compute_file_checksum;
use afetch_common::StructureFormat;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::expect_used)]
static STORED_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<id>.+)-AF-v(?P<version>\d+)\.(?P<ext>pdb|cif|bio)$").expect("static regex")
});

/// Local file name for a model version
pub fn local_file_name(code: &str, version: u32, format: StructureFormat) -> String {
    format!("{}-AF-v{}.{}", code, version, format.remote_extension())
}

/// A structure file found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub code: String,
    pub version: u32,
    pub extension: String,
    pub path: PathBuf,
    pub size: u64,
    pub checksum: String,
}

/// Flat directory of downloaded AlphaFold files
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a given model version is stored at
    pub fn path_for(&self, code: &str, version: u32, format: StructureFormat) -> PathBuf {
        self.dir.join(local_file_name(code, version, format))
    }

    /// Newest stored version of `code` in `format`, searching `versions` in order
    pub fn find_existing<I>(&self, code: &str, format: StructureFormat, versions: I) -> Option<(u32, PathBuf)>
    where
        I: IntoIterator<Item = u32>,
    {
        versions.into_iter().find_map(|version| {
            let path = self.path_for(code, version, format);
            if path.is_file() {
                debug!(code = %code, version, path = %path.display(), "Found stored structure");
                Some((version, path))
            } else {
                None
            }
        })
    }

    /// Write content, creating the directory if needed
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    /// All stored AlphaFold files, sorted by identifier then newest version first
    pub fn list(&self) -> Result<Vec<StoredFile>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(caps) = STORED_FILE.captures(name) else {
                continue;
            };
            let Ok(version) = caps["version"].parse() else {
                continue;
            };
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let path = entry.path();
            files.push(StoredFile {
                code: caps["id"].to_string(),
                version,
                extension: caps["ext"].to_string(),
                checksum: compute_file_checksum(&path)?,
                size: metadata.len(),
                path,
            });
        }

        files.sort_by(|a, b| a.code.cmp(&b.code).then(b.version.cmp(&a.version)));
        Ok(files)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("P69905", 4, StructureFormat::Cif), "P69905-AF-v4.cif");
        assert_eq!(
            local_file_name("P69905", 2, StructureFormat::Assembly(1)),
            "P69905-AF-v2.bio"
        );
    }

    #[test]
    fn test_find_existing_prefers_first_version() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        store.write(&store.path_for("Q8W3K0", 2, StructureFormat::Pdb), b"ATOM").unwrap();
        store.write(&store.path_for("Q8W3K0", 4, StructureFormat::Pdb), b"ATOM").unwrap();

        let (version, path) = store
            .find_existing("Q8W3K0", StructureFormat::Pdb, (1..=6).rev())
            .unwrap();
        assert_eq!(version, 4);
        assert!(path.ends_with("Q8W3K0-AF-v4.pdb"));

        assert!(store
            .find_existing("Q8W3K0", StructureFormat::Cif, (1..=6).rev())
            .is_none());
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("deep").join("er"));
        let path = store.path_for("P1", 1, StructureFormat::Cif);
        store.write(&path, b"data_P1").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"data_P1");
    }

    #[test]
    fn test_list_skips_unrelated_files() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        store.write(&store.path_for("B2", 1, StructureFormat::Cif), b"data_B2").unwrap();
        store.write(&store.path_for("A1", 3, StructureFormat::Pdb), b"ATOM").unwrap();
        store.write(&store.path_for("A1", 4, StructureFormat::Pdb), b"ATOM").unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(dir.path().join("A1-AF-v4.png"), b"img").unwrap();

        let files = store.list().unwrap();
        let keys: Vec<_> = files.iter().map(|f| (f.code.as_str(), f.version)).collect();
        assert_eq!(keys, vec![("A1", 4), ("A1", 3), ("B2", 1)]);
        assert_eq!(files[2].extension, "cif");
        assert_eq!(files[2].size, 7);
        assert_eq!(files[2].checksum.len(), 64);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }
}
