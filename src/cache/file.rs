use super::base128::{Base128Input, Base128Output};
use super::codec::{decode_repository, encode_repository};
use super::{CacheError, CACHE_VERSION};
use crate::loader::RepositoryLoader;
use crate::resources::ResourceRepository;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// First bytes of every cache file
pub const CACHE_MAGIC: &[u8; 8] = b"RESREPO\0";

/// Input file metadata for change detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileMetadata {
    /// Path below the resource root's parent
    pub relative_path: String,
    /// Modification time in seconds since the UNIX epoch
    pub mtime: u64,
    pub size: u64,
}

impl FileMetadata {
    pub fn from_path(path: &Path, relative_path: impl Into<String>) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(Self {
            relative_path: relative_path.into(),
            mtime,
            size: metadata.len(),
        })
    }
}

/// Hash of every input of a load: the discovered resource files plus
/// R.txt, public.txt and the manifest, or the library archive
pub fn fingerprint(loader: &RepositoryLoader) -> Result<u64, CacheError> {
    let mut inputs = Vec::new();
    if loader.is_archive() {
        // A packaged library is a single input
        let archive = loader.res_dir();
        if archive.is_file() {
            let name = archive.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            inputs.push(FileMetadata::from_path(archive, name)?);
        }
    } else {
        for folder in loader.find_folders()? {
            for file in &folder.files {
                inputs.push(FileMetadata::from_path(&file.path, format!("res/{}", file.relative_path))?);
            }
        }

        let siblings = [
            loader.r_txt_path(),
            loader.public_txt_path(),
            loader.res_dir().with_file_name("AndroidManifest.xml"),
        ];
        for path in &siblings {
            if path.is_file() {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                inputs.push(FileMetadata::from_path(path, name)?);
            }
        }
    }

    let mut hasher = DefaultHasher::new();
    inputs.len().hash(&mut hasher);
    for input in &inputs {
        input.hash(&mut hasher);
    }
    Ok(hasher.finish())
}

/// Write a frozen repository with the cache header
pub fn write_cache_file(path: &Path, repository: &ResourceRepository, fingerprint: u64) -> Result<(), CacheError> {
    let body = encode_repository(repository)?;

    let mut header = Base128Output::new();
    header.write_raw(CACHE_MAGIC);
    header.write_u32(CACHE_VERSION);
    header.write_u64(fingerprint);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    writer.write_all(&header.into_bytes())?;
    writer.write_all(&body)?;
    writer.flush()?;

    debug!("Wrote {} byte cache to {}", body.len(), path.display());
    Ok(())
}

/// Read a cache file. With `expected_fingerprint`, a cache built from other
/// inputs fails with [`CacheError::Stale`] before the body is decoded.
pub fn read_cache_file(path: &Path, expected_fingerprint: Option<u64>) -> Result<ResourceRepository, CacheError> {
    let bytes = fs::read(path)?;
    let mut input = Base128Input::new(&bytes);

    if input.read_raw(CACHE_MAGIC.len())? != CACHE_MAGIC {
        return Err(CacheError::InvalidFormat("not a resource cache file"));
    }
    let version = input.read_u32()?;
    if version != CACHE_VERSION {
        return Err(CacheError::VersionMismatch {
            found: version,
            expected: CACHE_VERSION,
        });
    }
    let fingerprint = input.read_u64()?;
    if expected_fingerprint.is_some_and(|expected| expected != fingerprint) {
        return Err(CacheError::Stale);
    }

    decode_repository(&mut input)
}

impl ResourceRepository {
    /// Persist this repository; `fingerprint` identifies its inputs
    pub fn write_cache(&self, path: &Path, fingerprint: u64) -> Result<(), CacheError> {
        write_cache_file(path, self, fingerprint)
    }

    /// Reuse the cache at `cache_path` when it was built from the current
    /// inputs, otherwise load from XML and rewrite the cache. The flag is
    /// `true` when the cache was used.
    pub fn load_cached_or_fresh(
        loader: &RepositoryLoader,
        cache_path: &Path,
    ) -> Result<(ResourceRepository, bool), CacheError> {
        let fingerprint = fingerprint(loader)?;

        match read_cache_file(cache_path, Some(fingerprint)) {
            Ok(repository) => {
                info!("Loaded {} from cache {}", loader.res_dir().display(), cache_path.display());
                return Ok((repository, true));
            }
            Err(CacheError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache at {}", cache_path.display());
            }
            Err(e) => warn!("Ignoring cache {}: {}", cache_path.display(), e),
        }

        let repository = loader.load()?;
        if let Err(e) = write_cache_file(cache_path, &repository, fingerprint) {
            warn!("Failed to write cache {}: {}", cache_path.display(), e);
        }
        Ok((repository, false))
    }
}
