use crate::resources::ResourceError;
use indexmap::IndexMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Directory of the resource folders inside a packaged library
pub const ARCHIVE_RES_DIR: &str = "res";

const ARCHIVE_EXTENSIONS: [&str; 3] = ["aar", "jar", "zip"];

/// Whether a resource root names a packaged library (`.aar`, `.jar` or
/// `.zip`) rather than a `res` directory
pub fn is_resource_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// The file entries of a packaged library, read into memory
#[derive(Debug)]
pub struct ResourceArchive {
    path: PathBuf,
    entries: IndexMap<String, Vec<u8>>,
}

impl ResourceArchive {
    /// Read every file entry. Entries that fail to decompress are skipped
    /// with a warning.
    pub fn open(path: &Path) -> Result<Self, ResourceError> {
        let mut archive = ZipArchive::new(File::open(path)?).map_err(|e| ResourceError::archive(path, e.to_string()))?;

        let mut entries = IndexMap::new();
        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping entry {} of {}: {}", index, path.display(), e);
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut contents = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut contents) {
                warn!("Skipping unreadable {} in {}: {}", name, path.display(), e);
                continue;
            }
            entries.insert(name, contents);
        }

        debug!("Read {} entries from {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// An archive without entries, standing in for one that cannot be read
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: IndexMap::new(),
        }
    }

    /// Read a single entry without loading the rest of the archive
    pub fn read_entry(path: &Path, name: &str) -> Result<Option<Vec<u8>>, ResourceError> {
        let mut archive = ZipArchive::new(File::open(path)?).map_err(|e| ResourceError::archive(path, e.to_string()))?;
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ResourceError::archive(path, e.to_string())),
        };
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        Ok(Some(contents))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the file entries, in archive order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Contents of the entry `name`, a `/`-separated path from the archive
    /// root
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Contents of a text entry; an entry that is not UTF-8 is an error
    pub fn entry_text(&self, name: &str) -> Option<Result<&str, ResourceError>> {
        let contents = self.entry(name)?;
        Some(std::str::from_utf8(contents).map_err(|e| ResourceError::archive(&self.path, format!("{}: {}", name, e))))
    }

    /// Display path of an entry, `library.aar/res/values/strings.xml`
    pub fn entry_path(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.path.clone(), |path, part| path.join(part))
    }
}
