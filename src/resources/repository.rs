use super::folder_config::FolderConfiguration;
use super::item::{
    ConfigId, ItemKind, RepositoryConfiguration, RepositoryId, ResolverId, ResourceItem, ResourceSourceFile,
    SourceFileId,
};
use super::namespace::{NamespaceResolver, ResourceNamespace};
use super::types::{ResourceType, ResourceVisibility};
use super::url::{ResourceUrl, UrlKind};
use super::ResourceError;
use crate::discovery::{is_resource_archive, ResourceArchive, ARCHIVE_RES_DIR};
use crate::parser::xml::ManifestParser;
use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Items of one type keyed by name, every configuration variant kept in
/// insertion order
pub type ResourceMap = IndexMap<String, Vec<ResourceItem>>;

const MANIFEST_FILE: &str = "AndroidManifest.xml";

static EMPTY_MAP: Lazy<ResourceMap> = Lazy::new(IndexMap::new);

/// Indexed store of the resources of one library or module.
///
/// A repository is populated by a loader (or the cache decoder) and then
/// frozen; after that every mutation fails with [`ResourceError::Frozen`]
/// and the repository can be shared freely between threads.
#[derive(Debug)]
pub struct ResourceRepository {
    id: RepositoryId,
    namespace: ResourceNamespace,
    library_name: Option<String>,
    /// The `res` directory
    origin: PathBuf,
    configurations: Vec<RepositoryConfiguration>,
    configuration_ids: HashMap<FolderConfiguration, ConfigId>,
    source_files: Vec<ResourceSourceFile>,
    resolvers: Vec<Arc<NamespaceResolver>>,
    resolver_ids: HashMap<Arc<NamespaceResolver>, ResolverId>,
    resources: BTreeMap<ResourceType, ResourceMap>,
    /// (name index, variant index) of public items, built by `freeze`
    public_resources: BTreeMap<ResourceType, Vec<(usize, usize)>>,
    frozen: bool,
    package_name: OnceCell<Option<String>>,
}

impl ResourceRepository {
    pub fn new(origin: impl Into<PathBuf>, namespace: ResourceNamespace, library_name: Option<String>) -> Self {
        let empty = Arc::new(NamespaceResolver::EMPTY);
        let mut resolver_ids = HashMap::new();
        resolver_ids.insert(empty.clone(), ResolverId::EMPTY);

        Self {
            id: RepositoryId::next(),
            namespace,
            library_name,
            origin: origin.into(),
            configurations: Vec::new(),
            configuration_ids: HashMap::new(),
            source_files: Vec::new(),
            resolvers: vec![empty],
            resolver_ids,
            resources: BTreeMap::new(),
            public_resources: BTreeMap::new(),
            frozen: false,
            package_name: OnceCell::new(),
        }
    }

    pub fn id(&self) -> RepositoryId {
        self.id
    }

    pub fn namespace(&self) -> &ResourceNamespace {
        &self.namespace
    }

    pub fn library_name(&self) -> Option<&str> {
        self.library_name.as_deref()
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_mutable(&self) -> Result<(), ResourceError> {
        if self.frozen {
            Err(ResourceError::Frozen)
        } else {
            Ok(())
        }
    }

    /// Register a folder configuration, reusing an identical one
    pub fn add_configuration(&mut self, folder_configuration: FolderConfiguration) -> Result<ConfigId, ResourceError> {
        self.ensure_mutable()?;
        if let Some(id) = self.configuration_ids.get(&folder_configuration) {
            return Ok(*id);
        }
        let id = ConfigId(self.configurations.len() as u32);
        self.configurations
            .push(RepositoryConfiguration::new(self.id, folder_configuration.clone()));
        self.configuration_ids.insert(folder_configuration, id);
        Ok(id)
    }

    /// Take over a configuration created for another repository
    pub(crate) fn adopt_configuration(
        &mut self,
        mut configuration: RepositoryConfiguration,
    ) -> Result<ConfigId, ResourceError> {
        self.ensure_mutable()?;
        configuration.transfer_ownership_to(self.id);
        if let Some(id) = self.configuration_ids.get(configuration.folder_configuration()) {
            return Ok(*id);
        }
        let id = ConfigId(self.configurations.len() as u32);
        self.configuration_ids
            .insert(configuration.folder_configuration().clone(), id);
        self.configurations.push(configuration);
        Ok(id)
    }

    pub fn add_source_file(
        &mut self,
        relative_path: Option<String>,
        configuration: ConfigId,
    ) -> Result<SourceFileId, ResourceError> {
        self.ensure_mutable()?;
        let id = SourceFileId(self.source_files.len() as u32);
        self.source_files.push(ResourceSourceFile {
            relative_path,
            configuration,
        });
        Ok(id)
    }

    /// Store a resolver, reusing the slot of an identical one
    pub fn intern_resolver(&mut self, resolver: Arc<NamespaceResolver>) -> Result<ResolverId, ResourceError> {
        self.ensure_mutable()?;
        if let Some(id) = self.resolver_ids.get(&resolver) {
            return Ok(*id);
        }
        let id = ResolverId(self.resolvers.len() as u32);
        self.resolvers.push(resolver.clone());
        self.resolver_ids.insert(resolver, id);
        Ok(id)
    }

    /// Add one resource variant.
    ///
    /// Returns `Ok(false)` without touching the index when a variant with
    /// the same type, name and configuration is already present.
    pub fn add_item(&mut self, item: ResourceItem) -> Result<bool, ResourceError> {
        self.ensure_mutable()?;
        let variants = self
            .resources
            .entry(item.resource_type())
            .or_default()
            .entry(item.name().to_string())
            .or_default();

        if variants
            .iter()
            .any(|existing| existing.configuration() == item.configuration())
        {
            trace!(
                "Skipping duplicate {}/{} in configuration {:?}",
                item.resource_type(),
                item.name(),
                item.configuration()
            );
            return Ok(false);
        }

        variants.push(item);
        Ok(true)
    }

    /// Whether a variant of `name` exists in `configuration`
    pub fn contains_variant(&self, resource_type: ResourceType, name: &str, configuration: ConfigId) -> bool {
        self.resources
            .get(&resource_type)
            .and_then(|map| map.get(name))
            .is_some_and(|variants| variants.iter().any(|item| item.configuration() == configuration))
    }

    /// Build the public index and reject any further mutation. Calling it
    /// again has no effect.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }

        for (resource_type, map) in &self.resources {
            let public: Vec<(usize, usize)> = map
                .values()
                .enumerate()
                .flat_map(|(name_index, variants)| {
                    variants
                        .iter()
                        .enumerate()
                        .filter(|(_, item)| item.visibility() == ResourceVisibility::Public)
                        .map(move |(variant_index, _)| (name_index, variant_index))
                })
                .collect();
            if !public.is_empty() {
                self.public_resources.insert(*resource_type, public);
            }
        }

        self.frozen = true;
        debug!(
            "Froze repository {} with {} items ({} configurations, {} resolvers)",
            self.origin.display(),
            self.item_count(),
            self.configurations.len(),
            self.resolvers.len()
        );
    }

    pub fn configurations(&self) -> &[RepositoryConfiguration] {
        &self.configurations
    }

    pub fn configuration(&self, id: ConfigId) -> Option<&RepositoryConfiguration> {
        self.configurations.get(id.index())
    }

    pub fn folder_configuration(&self, id: ConfigId) -> Option<&FolderConfiguration> {
        self.configuration(id).map(RepositoryConfiguration::folder_configuration)
    }

    pub fn source_files(&self) -> &[ResourceSourceFile] {
        &self.source_files
    }

    pub fn source_file(&self, id: SourceFileId) -> Option<&ResourceSourceFile> {
        self.source_files.get(id.index())
    }

    pub fn resolvers(&self) -> &[Arc<NamespaceResolver>] {
        &self.resolvers
    }

    pub fn resolver(&self, id: ResolverId) -> Option<&Arc<NamespaceResolver>> {
        self.resolvers.get(id.index())
    }

    /// Every variant of every resource of `resource_type`; empty for other
    /// namespaces and unknown types
    pub fn get_resources(&self, namespace: &ResourceNamespace, resource_type: ResourceType) -> &ResourceMap {
        if *namespace != self.namespace {
            return &EMPTY_MAP;
        }
        self.resources.get(&resource_type).unwrap_or(&EMPTY_MAP)
    }

    pub fn get_resources_named(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
        name: &str,
    ) -> &[ResourceItem] {
        self.get_resources(namespace, resource_type)
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Public items of a type. Only available once frozen.
    pub fn public_resources(&self, namespace: &ResourceNamespace, resource_type: ResourceType) -> Vec<&ResourceItem> {
        if *namespace != self.namespace {
            return Vec::new();
        }
        let (Some(map), Some(index)) = (
            self.resources.get(&resource_type),
            self.public_resources.get(&resource_type),
        ) else {
            return Vec::new();
        };

        index
            .iter()
            .filter_map(|(name_index, variant_index)| {
                map.get_index(*name_index)
                    .and_then(|(_, variants)| variants.get(*variant_index))
            })
            .collect()
    }

    /// Variant of `name` best matching a device configuration
    pub fn best_match(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
        name: &str,
        target: &FolderConfiguration,
    ) -> Option<&ResourceItem> {
        let variants = self.get_resources_named(namespace, resource_type, name);
        let default = FolderConfiguration::default();
        let configurations: Vec<&FolderConfiguration> = variants
            .iter()
            .map(|item| self.folder_configuration(item.configuration()).unwrap_or(&default))
            .collect();
        FolderConfiguration::best_match(&configurations, target).and_then(|index| variants.get(index))
    }

    /// Types that have at least one item
    pub fn types(&self) -> impl Iterator<Item = ResourceType> + '_ {
        self.resources
            .iter()
            .filter(|(_, map)| !map.is_empty())
            .map(|(resource_type, _)| *resource_type)
    }

    pub fn all_items(&self) -> impl Iterator<Item = &ResourceItem> {
        self.resources.values().flat_map(|map| map.values().flatten())
    }

    pub fn item_count(&self) -> usize {
        self.resources
            .values()
            .map(|map| map.values().map(Vec::len).sum::<usize>())
            .sum()
    }

    /// Namespace an item belongs to; attrs may come from a foreign namespace
    pub fn item_namespace(&self, item: &ResourceItem) -> ResourceNamespace {
        match item.kind() {
            ItemKind::Attr(definition) => definition
                .namespace
                .clone()
                .unwrap_or_else(|| self.namespace.clone()),
            ItemKind::AttrReference(reference) => reference.namespace.clone(),
            _ => self.namespace.clone(),
        }
    }

    /// Package of the repository: the namespace package if it has one,
    /// otherwise the `package` of the library's AndroidManifest.xml, read on
    /// first use. Threads racing on the first call all see the one stored
    /// value.
    pub fn package_name(&self) -> Option<&str> {
        if let Some(package) = self.namespace.package_name() {
            return Some(package);
        }
        self.package_name.get_or_init(|| self.read_manifest_package()).as_deref()
    }

    fn read_manifest_package(&self) -> Option<String> {
        let parser = ManifestParser::new();
        let package = if self.is_archive() {
            let manifest = self.origin.join(MANIFEST_FILE);
            ResourceArchive::read_entry(&self.origin, MANIFEST_FILE).and_then(|contents| match contents {
                Some(contents) => parser.parse_package_content(&manifest, &contents),
                None => Ok(None),
            })
        } else {
            parser.parse_package(&self.manifest_path()?)
        };
        package.unwrap_or_else(|e| {
            debug!("No package name for {}: {}", self.origin.display(), e);
            None
        })
    }

    /// AndroidManifest.xml next to the `res` directory; `None` for a
    /// packaged library, which keeps it inside the archive
    pub fn manifest_path(&self) -> Option<PathBuf> {
        if self.is_archive() {
            return None;
        }
        self.origin.parent().map(|parent| parent.join(MANIFEST_FILE))
    }

    /// Whether the repository was loaded from a packaged library
    pub fn is_archive(&self) -> bool {
        is_resource_archive(&self.origin)
    }

    /// `type[-qualifiers]/name`, e.g. `string-fr/hello`
    pub fn key(&self, item: &ResourceItem) -> String {
        let qualifiers = self
            .folder_configuration(item.configuration())
            .map(FolderConfiguration::qualifier_string)
            .unwrap_or_default();
        if qualifiers.is_empty() {
            format!("{}/{}", item.resource_type(), item.name())
        } else {
            format!("{}-{}/{}", item.resource_type(), qualifiers, item.name())
        }
    }

    /// `@[package:]type/name` reference to an item
    pub fn resource_url(&self, item: &ResourceItem) -> ResourceUrl {
        let namespace = self.item_namespace(item);
        let prefix = match &namespace {
            ResourceNamespace::ResAuto | ResourceNamespace::Tools => None,
            other => other.package_name().map(str::to_string),
        };
        ResourceUrl {
            kind: UrlKind::Reference,
            namespace: prefix,
            resource_type: Some(item.resource_type()),
            name: item.name().to_string(),
            private_access: false,
        }
    }

    /// Absolute path of the file defining an item
    pub fn source_path(&self, item: &ResourceItem) -> Option<PathBuf> {
        let relative = match item.kind() {
            ItemKind::File { relative_path, .. } => relative_path.as_str(),
            _ => self
                .source_file(item.source_file()?)?
                .relative_path
                .as_deref()?,
        };
        let root = if self.is_archive() {
            self.origin.join(ARCHIVE_RES_DIR)
        } else {
            self.origin.clone()
        };
        Some(relative.split('/').fold(root, |path, part| path.join(part)))
    }
}
