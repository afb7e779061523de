use super::archive::{ResourceArchive, ARCHIVE_RES_DIR};
use crate::config::DEFAULT_AAPT_IGNORE;
use crate::resources::{FolderConfiguration, ResourceError, ResourceFolderType};
use ignore::{DirEntry, Walk, WalkBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// One entry of an aapt ignore pattern
#[derive(Debug, Clone, PartialEq, Eq)]
struct IgnoreRule {
    /// Lower-cased glob with `*` wildcards
    pattern: String,
    dirs_only: bool,
    files_only: bool,
}

impl IgnoreRule {
    fn parse(token: &str) -> Option<Self> {
        // `!` only silences aapt's warning; the entry is ignored either way
        let token = token.trim().trim_start_matches('!');
        let (token, dirs_only, files_only) = if let Some(rest) = token.strip_prefix("<dir>") {
            (rest, true, false)
        } else if let Some(rest) = token.strip_prefix("<file>") {
            (rest, false, true)
        } else {
            (token, false, false)
        };
        if token.is_empty() {
            return None;
        }
        Some(Self {
            pattern: token.to_lowercase(),
            dirs_only,
            files_only,
        })
    }

    fn matches(&self, name: &str, is_dir: bool) -> bool {
        if (self.dirs_only && !is_dir) || (self.files_only && is_dir) {
            return false;
        }
        glob_match(&self.pattern, &name.to_lowercase())
    }
}

/// Glob matching for single path segments, `*` matching any run of
/// characters
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return text == pattern;
    }

    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };
    let last = rest[rest.len() - 1];
    for middle in &rest[..rest.len() - 1] {
        match remaining.find(middle) {
            Some(index) => remaining = &remaining[index + middle.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

/// The colon-separated file filter aapt applies to resource directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AaptIgnore {
    rules: Vec<IgnoreRule>,
}

impl AaptIgnore {
    pub fn parse(pattern: &str) -> Self {
        Self {
            rules: pattern.split(':').filter_map(IgnoreRule::parse).collect(),
        }
    }

    pub fn is_ignored(&self, name: &str, is_dir: bool) -> bool {
        self.rules.iter().any(|rule| rule.matches(name, is_dir))
    }
}

impl Default for AaptIgnore {
    fn default() -> Self {
        Self::parse(DEFAULT_AAPT_IGNORE)
    }
}

/// A folder directly below `res/` with a recognized type and valid
/// qualifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub folder_type: ResourceFolderType,
    pub configuration: FolderConfiguration,
}

impl FolderInfo {
    /// Classify a folder; `None` for unknown types and invalid qualifiers
    pub fn from_folder_name(name: &str) -> Option<Self> {
        let folder_type = ResourceFolderType::from_folder_name(name)?;
        let configuration = FolderConfiguration::from_folder_name(name)?;
        Some(Self {
            name: name.to_string(),
            folder_type,
            configuration,
        })
    }

    pub fn is_values(&self) -> bool {
        self.folder_type == ResourceFolderType::Values
    }
}

/// A discovered resource file
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: PathBuf,
    /// Path below the resource root, `/`-separated
    pub relative_path: String,
    pub file_name: String,
}

impl ResourceFile {
    /// File name up to the first dot, which is the resource name of file
    /// resources (`icon.9.png` is `icon`)
    pub fn resource_name(&self) -> &str {
        self.file_name.split('.').next().unwrap_or(&self.file_name)
    }

    pub fn is_xml(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".xml")
    }
}

/// A resource folder with its files, in file name order
#[derive(Debug, Clone)]
pub struct ResourceFolder {
    pub info: FolderInfo,
    pub path: PathBuf,
    pub files: Vec<ResourceFile>,
}

/// Finds the resource folders and files below a `res` directory
pub struct ResourceFileFinder {
    ignore: Arc<AaptIgnore>,
}

impl ResourceFileFinder {
    pub fn new(ignore: AaptIgnore) -> Self {
        Self {
            ignore: Arc::new(ignore),
        }
    }

    /// Folders sorted by name, files within a folder sorted by name.
    /// Unknown folders, invalid qualifiers and ignored entries are skipped.
    pub fn find_folders(&self, res_dir: &Path) -> Result<Vec<ResourceFolder>, ResourceError> {
        debug!("Scanning for resources in: {}", res_dir.display());

        if !res_dir.is_dir() {
            trace!("Resource directory does not exist: {}", res_dir.display());
            return Ok(Vec::new());
        }

        let folders = self.collect_folders(self.walk(res_dir));

        debug!(
            "Found {} resource folders with {} files",
            folders.len(),
            folders.iter().map(|f| f.files.len()).sum::<usize>()
        );
        Ok(folders)
    }

    fn walk(&self, res_dir: &Path) -> Walk {
        let ignore = self.ignore.clone();
        WalkBuilder::new(res_dir)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(Some(2))
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let name = entry.file_name().to_string_lossy();
                !ignore.is_ignored(&name, is_dir)
            })
            .build()
    }

    /// Group walk entries into folders. An entry that cannot be read is
    /// skipped with a warning.
    fn collect_folders(&self, entries: impl IntoIterator<Item = Result<DirEntry, ignore::Error>>) -> Vec<ResourceFolder> {
        let mut folders: Vec<ResourceFolder> = Vec::new();
        let mut current_folder_skipped = false;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable resource entry: {}", e);
                    continue;
                }
            };
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name().to_string_lossy().into_owned();

            match entry.depth() {
                1 if is_dir => match FolderInfo::from_folder_name(&name) {
                    Some(info) => {
                        trace!("Found {:?} folder: {}", info.folder_type, name);
                        folders.push(ResourceFolder {
                            info,
                            path: entry.path().to_path_buf(),
                            files: Vec::new(),
                        });
                        current_folder_skipped = false;
                    }
                    None => {
                        trace!("Skipping folder: {}", name);
                        current_folder_skipped = true;
                    }
                },
                2 if !is_dir && !current_folder_skipped => {
                    if let Some(folder) = folders.last_mut() {
                        folder.files.push(ResourceFile {
                            path: entry.path().to_path_buf(),
                            relative_path: format!("{}/{}", folder.info.name, name),
                            file_name: name,
                        });
                    }
                }
                _ => {}
            }
        }

        folders
    }

    /// Folders below `res/` of a packaged library, ordered and filtered the
    /// same way as a directory. File paths point into the archive.
    pub fn find_archive_folders(&self, archive: &ResourceArchive) -> Vec<ResourceFolder> {
        let prefix = format!("{}/", ARCHIVE_RES_DIR);
        let mut by_folder: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for name in archive.entry_names() {
            let Some((folder, file)) = name.strip_prefix(&prefix).and_then(|rest| rest.split_once('/')) else {
                continue;
            };
            if !file.is_empty() && !file.contains('/') {
                by_folder.entry(folder).or_default().push(file);
            }
        }

        let mut folders = Vec::new();
        for (folder_name, mut files) in by_folder {
            if self.ignore.is_ignored(folder_name, true) {
                continue;
            }
            let Some(info) = FolderInfo::from_folder_name(folder_name) else {
                trace!("Skipping folder: {}", folder_name);
                continue;
            };
            files.sort_unstable();
            let files = files
                .into_iter()
                .filter(|file_name| !self.ignore.is_ignored(file_name, false))
                .map(|file_name| {
                    let relative_path = format!("{}/{}", folder_name, file_name);
                    ResourceFile {
                        path: archive.entry_path(&format!("{}{}", prefix, relative_path)),
                        relative_path,
                        file_name: file_name.to_string(),
                    }
                })
                .collect();
            folders.push(ResourceFolder {
                info,
                path: archive.entry_path(&format!("{}{}", prefix, folder_name)),
                files,
            });
        }

        debug!(
            "Found {} resource folders in {}",
            folders.len(),
            archive.path().display()
        );
        folders
    }
}

impl Default for ResourceFileFinder {
    fn default() -> Self {
        Self::new(AaptIgnore::default())
    }
}
