mod archive;
mod file_finder;

pub use archive::{is_resource_archive, ResourceArchive, ARCHIVE_RES_DIR};
pub use file_finder::{AaptIgnore, FolderInfo, ResourceFile, ResourceFileFinder, ResourceFolder};
