mod base128;
mod codec;
mod file;

pub use base128::{Base128Input, Base128Output};
pub use codec::{decode_repository, encode_repository};
pub use file::{fingerprint, read_cache_file, write_cache_file, FileMetadata, CACHE_MAGIC};

use crate::resources::ResourceError;
use thiserror::Error;

/// Current cache format version
pub const CACHE_VERSION: u32 = 1;

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to access cache file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt cache: {0}")]
    InvalidFormat(&'static str),
    #[error("Cache version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("Cache was built from different resource files")]
    Stale,
    #[error("Only frozen repositories can be cached")]
    NotFrozen,
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
