//! resource-repository - Android resource loading and indexing
//!
//! This library loads the resources of an Android module or exploded AAR
//! into an indexed, immutable repository that can be queried by namespace,
//! type and name, and persisted to a compact binary cache.
//!
//! # Architecture
//!
//! The loading pipeline consists of:
//! 1. **Discovery** - Find resource folders and files below `res/`
//! 2. **Symbols** - Read `R.txt` for ids and `public.txt` for visibility
//! 3. **Parsing** - Stream value XML files with namespace scope tracking
//! 4. **Indexing** - Collect every configuration variant per type and name
//! 5. **Freezing** - Build the public index and forbid further changes
//! 6. **Caching** - Encode the frozen repository for fast reloads

pub mod cache;
pub mod config;
pub mod discovery;
pub mod loader;
pub mod parser;
pub mod report;
pub mod resources;

pub use cache::{read_cache_file, write_cache_file, CacheError};
pub use config::Config;
pub use discovery::{AaptIgnore, ResourceArchive, ResourceFileFinder};
pub use loader::{load_all, LoaderOptions, RepositoryLoader, VisibilityLookup};
pub use parser::xml::ValueResourceXmlParser;
pub use report::{ItemQuery, ReportFormat, Reporter};
pub use resources::{
    FolderConfiguration, ItemKind, NamespaceResolver, ResourceError, ResourceItem, ResourceNamespace,
    ResourceRepository, ResourceType, ResourceVisibility,
};
