mod folder_config;
mod item;
mod namespace;
mod repository;
mod types;
mod url;

pub use folder_config::{FolderConfiguration, LocaleQualifier, Qualifier, QualifierKind};
pub use item::{
    AttrDefinition, AttrReference, ConfigId, ItemKind, RepositoryConfiguration, RepositoryId, ResolverId,
    ResourceItem, ResourceSourceFile, SourceFileId, StyleItem,
};
pub use namespace::{
    NamespaceResolver, ResourceNamespace, ANDROID_URI, AUTO_URI, TOOLS_URI, URI_PREFIX, XLIFF_URI,
};
pub use repository::{ResourceMap, ResourceRepository};
pub use types::{Arity, AttributeFormats, Density, ResourceFolderType, ResourceType, ResourceVisibility};
pub use url::{ResourceUrl, UrlKind};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or querying a repository
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The namespace resolver was queried away from a start tag
    #[error("Check failed.")]
    CheckFailed,
    #[error("Repository is frozen and can no longer be modified")]
    Frozen,
    #[error("{}: {message}", file.display())]
    Xml { file: PathBuf, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{}:{line}: {message}", file.display())]
    SymbolFile {
        file: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Namespace scope closed by a different element than the one that opened it")]
    UnbalancedScope,
    #[error("{}: invalid resource archive: {message}", file.display())]
    Archive { file: PathBuf, message: String },
}

impl ResourceError {
    pub(crate) fn xml(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ResourceError::Xml {
            file: file.into(),
            message: message.into(),
        }
    }

    pub(crate) fn archive(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ResourceError::Archive {
            file: file.into(),
            message: message.into(),
        }
    }
}
