//! Loading of a resource root into a frozen [`ResourceRepository`].
//!
//! A resource root is a `res` directory or a packaged library (`.aar`,
//! `.jar`, `.zip`). An exploded AAR keeps `R.txt`, `public.txt` and
//! `AndroidManifest.xml` next to `res`; a packaged one has the same layout
//! from the archive root:
//!
//! ```text
//! library/
//!   AndroidManifest.xml
//!   R.txt
//!   public.txt
//!   res/
//!     values/strings.xml
//!     layout/main.xml
//! ```
//!
//! IDs come from `R.txt` when it parses to at least one id, otherwise from
//! `@+id/` declarations in layouts and other id-generating folders.
//! Visibility comes from `public.txt`; without it every resource is public.

mod attrs;
mod values;

pub use attrs::AttrCollector;
pub use values::{ValueFileItems, ValueFileReader};

use crate::config::Config;
use crate::discovery::{
    is_resource_archive, AaptIgnore, ResourceArchive, ResourceFile, ResourceFileFinder, ResourceFolder, ARCHIVE_RES_DIR,
};
use crate::parser::xml::{LayoutParser, ScannedIds, ValueResourceXmlParser};
use crate::parser::{PublicResources, SymbolTable};
use crate::resources::{
    ConfigId, FolderConfiguration, ResourceError, ResourceItem, ResourceNamespace, ResourceRepository,
    ResourceType, ResourceVisibility, SourceFileId,
};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const R_TXT: &str = "R.txt";
pub const PUBLIC_TXT: &str = "public.txt";

/// Settings shared by every repository a loader builds
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub namespace: ResourceNamespace,
    pub library_name: Option<String>,
    pub aapt_ignore: AaptIgnore,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            namespace: ResourceNamespace::ResAuto,
            library_name: None,
            aapt_ignore: AaptIgnore::default(),
        }
    }
}

impl LoaderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            namespace: ResourceNamespace::parse(&config.namespace),
            library_name: config.library_name.clone(),
            aapt_ignore: AaptIgnore::parse(&config.effective_aapt_ignore()),
        }
    }
}

/// Visibility of resources as declared by an optional public.txt
#[derive(Debug, Clone, Default)]
pub struct VisibilityLookup {
    public: Option<PublicResources>,
}

impl VisibilityLookup {
    /// Every resource is public
    pub fn all_public() -> Self {
        Self { public: None }
    }

    /// Listed resources are public, all others private
    pub fn from_public_resources(public: PublicResources) -> Self {
        Self { public: Some(public) }
    }

    /// Read a public.txt. A missing or unreadable file makes every
    /// resource public.
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            debug!("No {} at {}", PUBLIC_TXT, path.display());
            return Self::all_public();
        }
        match PublicResources::parse(path) {
            Ok(public) => {
                debug!("Read {} public resources from {}", public.len(), path.display());
                Self::from_public_resources(public)
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::all_public()
            }
        }
    }

    /// Read the public.txt entry of a packaged library
    pub fn from_archive(archive: &ResourceArchive) -> Self {
        match archive.entry_text(PUBLIC_TXT) {
            None => {
                debug!("No {} in {}", PUBLIC_TXT, archive.path().display());
                Self::all_public()
            }
            Some(Ok(text)) => Self::from_public_resources(PublicResources::parse_content(text)),
            Some(Err(e)) => {
                warn!("Failed to read {}: {}", PUBLIC_TXT, e);
                Self::all_public()
            }
        }
    }

    pub fn has_public_txt(&self) -> bool {
        self.public.is_some()
    }

    pub fn visibility(&self, resource_type: ResourceType, name: &str) -> ResourceVisibility {
        let Some(public) = &self.public else {
            return ResourceVisibility::Public;
        };
        // public.txt lists field names of the R class
        let field_name: String = name
            .chars()
            .map(|c| if matches!(c, '.' | '-' | ':') { '_' } else { c })
            .collect();
        if public.contains(resource_type, &field_name) {
            ResourceVisibility::Public
        } else {
            ResourceVisibility::Private
        }
    }
}

/// Where the files of a resource root are read from
enum RootContents {
    Directory,
    Archive(ResourceArchive),
}

impl RootContents {
    fn read(&self, file: &ResourceFile) -> io::Result<Vec<u8>> {
        match self {
            RootContents::Directory => fs::read(&file.path),
            RootContents::Archive(archive) => archive
                .entry(&format!("{}/{}", ARCHIVE_RES_DIR, file.relative_path))
                .map(<[u8]>::to_vec)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, file.relative_path.clone())),
        }
    }
}

/// Builds the repository of one resource root
pub struct RepositoryLoader {
    res_dir: PathBuf,
    options: LoaderOptions,
}

impl RepositoryLoader {
    pub fn new(res_dir: impl Into<PathBuf>, options: LoaderOptions) -> Self {
        Self {
            res_dir: res_dir.into(),
            options,
        }
    }

    /// The `res` directory or the library archive
    pub fn res_dir(&self) -> &Path {
        &self.res_dir
    }

    pub fn is_archive(&self) -> bool {
        is_resource_archive(&self.res_dir)
    }

    fn sibling(&self, name: &str) -> PathBuf {
        match self.res_dir.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn r_txt_path(&self) -> PathBuf {
        self.sibling(R_TXT)
    }

    pub fn public_txt_path(&self) -> PathBuf {
        self.sibling(PUBLIC_TXT)
    }

    /// Discover the resource folders of the root
    pub fn find_folders(&self) -> Result<Vec<ResourceFolder>, ResourceError> {
        ResourceFileFinder::new(self.options.aapt_ignore.clone()).find_folders(&self.res_dir)
    }

    /// IDs declared by R.txt; `None` when it is missing, broken or declares
    /// no ids
    fn load_r_txt_ids(&self, contents: &RootContents) -> Option<Vec<String>> {
        let parsed = match contents {
            RootContents::Directory => {
                let path = self.r_txt_path();
                if !path.is_file() {
                    debug!("No {} at {}", R_TXT, path.display());
                    return None;
                }
                let table = SymbolTable::parse(&path);
                (path, table)
            }
            RootContents::Archive(archive) => {
                let path = archive.entry_path(R_TXT);
                let Some(text) = archive.entry_text(R_TXT) else {
                    debug!("No {} in {}", R_TXT, archive.path().display());
                    return None;
                };
                let table = text.and_then(|text| SymbolTable::parse_content(&path, text));
                (path, table)
            }
        };

        match parsed {
            (path, Ok(table)) => {
                let ids = table.ids();
                if ids.is_empty() {
                    debug!("{} declares no ids, scanning layouts instead", path.display());
                    None
                } else {
                    Some(ids)
                }
            }
            (path, Err(e)) => {
                warn!("Failed to parse {}, scanning layouts instead: {}", path.display(), e);
                None
            }
        }
    }

    fn open(&self) -> Result<(RootContents, Vec<ResourceFolder>), ResourceError> {
        if !self.is_archive() {
            return Ok((RootContents::Directory, self.find_folders()?));
        }
        let archive = ResourceArchive::open(&self.res_dir).unwrap_or_else(|e| {
            warn!("Failed to load resources from {}: {}", self.res_dir.display(), e);
            ResourceArchive::empty(&self.res_dir)
        });
        let folders = ResourceFileFinder::new(self.options.aapt_ignore.clone()).find_archive_folders(&archive);
        Ok((RootContents::Archive(archive), folders))
    }

    /// Load, index and freeze the repository
    pub fn load(&self) -> Result<ResourceRepository, ResourceError> {
        let start = Instant::now();
        let mut repository = ResourceRepository::new(
            &self.res_dir,
            self.options.namespace.clone(),
            self.options.library_name.clone(),
        );

        let (contents, folders) = self.open()?;
        let visibility = match &contents {
            RootContents::Directory => VisibilityLookup::load(&self.public_txt_path()),
            RootContents::Archive(archive) => VisibilityLookup::from_archive(archive),
        };
        let r_txt_ids = self.load_r_txt_ids(&contents);

        let mut parser = ValueResourceXmlParser::new();
        let mut attrs = AttrCollector::new();
        let mut layout_ids: Vec<(String, (SourceFileId, ConfigId))> = Vec::new();
        let layout_parser = LayoutParser::new();

        for folder in &folders {
            let config = repository.add_configuration(folder.info.configuration.clone())?;

            if folder.info.is_values() {
                for file in folder.files.iter().filter(|file| file.is_xml()) {
                    let bytes = match contents.read(file) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!("Skipping unreadable {}: {}", file.path.display(), e);
                            continue;
                        }
                    };
                    let source_file = repository.add_source_file(Some(file.relative_path.clone()), config)?;
                    parser.set_input(&file.path, bytes);

                    let mut reader = ValueFileReader::new(&mut parser, &mut repository, &visibility, (source_file, config));
                    let outcome = reader.read();
                    let items = reader.into_items();
                    if let Err(e) = outcome {
                        warn!("Failed to parse {}: {}", file.path.display(), e);
                    }

                    debug!(
                        "Read {} values, {} attrs, {} styleables from {}",
                        items.items.len(),
                        items.attrs.len(),
                        items.styleables.len(),
                        file.relative_path
                    );
                    for item in items.items.into_values() {
                        repository.add_item(item)?;
                    }
                    items.attrs.into_iter().for_each(|attr| attrs.add_attr(attr));
                    items
                        .attr_candidates
                        .into_iter()
                        .for_each(|attr| attrs.add_candidate(attr));
                    items
                        .styleables
                        .into_iter()
                        .for_each(|styleable| attrs.add_styleable(styleable));
                }
                continue;
            }

            let Some(resource_type) = folder.info.folder_type.resource_type() else {
                continue;
            };
            let density = if folder.info.folder_type.is_density_based() {
                folder.info.configuration.density()
            } else {
                None
            };

            for file in &folder.files {
                let name = file.resource_name();
                let item = ResourceItem::file(
                    resource_type,
                    name,
                    visibility.visibility(resource_type, name),
                    config,
                    file.relative_path.clone(),
                    density,
                );
                repository.add_item(item)?;

                if r_txt_ids.is_none() && folder.info.folder_type.is_id_generating() && file.is_xml() {
                    let scanned = match contents.read(file) {
                        Ok(bytes) => layout_parser.parse(&file.path, &bytes),
                        Err(e) => ScannedIds {
                            error: Some(e.into()),
                            ..ScannedIds::default()
                        },
                    };
                    if !scanned.ids.is_empty() {
                        let source_file = repository.add_source_file(Some(file.relative_path.clone()), config)?;
                        layout_ids.extend(scanned.ids.into_iter().map(|id| (id, (source_file, config))));
                    }
                    if let Some(e) = scanned.error {
                        warn!("Failed to scan {} for ids: {}", file.path.display(), e);
                    }
                }
            }
        }

        attrs.finish(&mut repository)?;

        for (name, source) in layout_ids {
            add_id(&mut repository, &visibility, name, source)?;
        }

        if let Some(ids) = r_txt_ids {
            let config = repository.add_configuration(FolderConfiguration::default())?;
            let source = (repository.add_source_file(None, config)?, config);
            for name in ids {
                add_id(&mut repository, &visibility, name, source)?;
            }
        }

        repository.freeze();
        info!(
            "Loaded {} resources from {} in {:.2?}",
            repository.item_count(),
            self.res_dir.display(),
            start.elapsed()
        );
        Ok(repository)
    }
}

/// Add a synthesized id unless the name already exists in that
/// configuration
fn add_id(
    repository: &mut ResourceRepository,
    visibility: &VisibilityLookup,
    name: String,
    source: (SourceFileId, ConfigId),
) -> Result<(), ResourceError> {
    if repository.contains_variant(ResourceType::Id, &name, source.1) {
        return Ok(());
    }
    let item = ResourceItem::synthesized_id(name.clone(), visibility.visibility(ResourceType::Id, &name), source);
    repository.add_item(item)?;
    Ok(())
}

/// Load independent resource roots in parallel, one loader per root
pub fn load_all(roots: &[PathBuf], options: &LoaderOptions) -> Vec<Result<ResourceRepository, ResourceError>> {
    roots
        .par_iter()
        .map(|root| RepositoryLoader::new(root, options.clone()).load())
        .collect()
}
