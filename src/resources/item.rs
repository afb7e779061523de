use super::folder_config::FolderConfiguration;
use super::namespace::{NamespaceResolver, ResourceNamespace};
use super::types::{Arity, AttributeFormats, Density, ResourceType, ResourceVisibility};
use super::url::ResourceUrl;
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

static NEXT_REPOSITORY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a repository instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepositoryId(u64);

impl RepositoryId {
    pub fn next() -> Self {
        Self(NEXT_REPOSITORY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index into a repository's configuration table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(pub(crate) u32);

/// Index into a repository's source file table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFileId(pub(crate) u32);

/// Index into a repository's namespace resolver table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResolverId(pub(crate) u32);

impl ConfigId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SourceFileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ResolverId {
    /// The resolver without any bindings, always at index 0
    pub const EMPTY: ResolverId = ResolverId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A folder configuration owned by one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfiguration {
    owner: RepositoryId,
    folder_configuration: FolderConfiguration,
}

impl RepositoryConfiguration {
    pub fn new(owner: RepositoryId, folder_configuration: FolderConfiguration) -> Self {
        Self {
            owner,
            folder_configuration,
        }
    }

    pub fn owner(&self) -> RepositoryId {
        self.owner
    }

    pub fn folder_configuration(&self) -> &FolderConfiguration {
        &self.folder_configuration
    }

    /// Hand the configuration to another repository
    pub fn transfer_ownership_to(&mut self, owner: RepositoryId) {
        self.owner = owner;
    }
}

/// The file a resource was defined in; `relative_path` is `None` for
/// resources synthesized from R.txt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSourceFile {
    pub relative_path: Option<String>,
    pub configuration: ConfigId,
}

/// One `<item name="attr">value</item>` of a style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleItem {
    attr_name: String,
    value: Option<String>,
    resolver: ResolverId,
    attr: Option<(ResourceNamespace, String)>,
}

impl StyleItem {
    /// `resolver` is the namespace scope of the `<item>` tag and must be the
    /// resolver stored at `resolver_id`
    pub fn new(
        attr_name: String,
        value: Option<String>,
        resolver_id: ResolverId,
        resolver: &NamespaceResolver,
        default_namespace: &ResourceNamespace,
    ) -> Self {
        let attr = ResourceUrl::parse_attr_reference(&attr_name).and_then(|url| {
            ResourceNamespace::from_prefix(url.namespace.as_deref(), default_namespace, resolver)
                .map(|namespace| (namespace, url.name))
        });
        Self {
            attr_name,
            value,
            resolver: resolver_id,
            attr,
        }
    }

    /// Attr name as written, e.g. `android:textColor`
    pub fn attr_name(&self) -> &str {
        &self.attr_name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn resolver(&self) -> ResolverId {
        self.resolver
    }

    /// Namespace and name of the attr this item sets, when resolvable
    pub fn attr(&self) -> Option<(&ResourceNamespace, &str)> {
        self.attr.as_ref().map(|(namespace, name)| (namespace, name.as_str()))
    }

    fn dedupe_key(&self) -> (Option<ResourceNamespace>, String) {
        match &self.attr {
            Some((namespace, name)) => (Some(namespace.clone()), name.clone()),
            None => (None, self.attr_name.clone()),
        }
    }
}

/// Declared formats and enum/flag values of an attr
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttrDefinition {
    /// Set when the attr belongs to another namespace than its repository
    pub namespace: Option<ResourceNamespace>,
    pub description: Option<String>,
    pub group_name: Option<String>,
    pub formats: AttributeFormats,
    /// Enum or flag name to its numeric value
    pub values: IndexMap<String, Option<i32>>,
    pub value_descriptions: IndexMap<String, String>,
}

/// A reference to an attr defined elsewhere, as found inside
/// `<declare-styleable>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrReference {
    pub namespace: ResourceNamespace,
    pub description: Option<String>,
    pub group_name: Option<String>,
}

/// Variant payload of a resource item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Value {
        text: Option<String>,
        raw_xml: Option<String>,
    },
    Array {
        elements: Vec<String>,
        default_index: usize,
    },
    Plurals {
        quantities: Vec<(Arity, String)>,
        default_index: usize,
    },
    Attr(AttrDefinition),
    AttrReference(AttrReference),
    Style {
        parent: Option<String>,
        items: Vec<StyleItem>,
    },
    Styleable {
        attrs: Vec<ResourceItem>,
    },
    File {
        relative_path: String,
        density: Option<Density>,
    },
}

/// One resource definition in one configuration.
///
/// Equality and hashing only look at type, name and visibility; telling
/// variants of the same resource apart is the job of the repository index.
#[derive(Debug, Clone)]
pub struct ResourceItem {
    resource_type: ResourceType,
    name: String,
    visibility: ResourceVisibility,
    configuration: ConfigId,
    source_file: Option<SourceFileId>,
    resolver: ResolverId,
    kind: ItemKind,
}

impl ResourceItem {
    fn new(
        resource_type: ResourceType,
        name: String,
        visibility: ResourceVisibility,
        configuration: ConfigId,
        source_file: Option<SourceFileId>,
        kind: ItemKind,
    ) -> Self {
        Self {
            resource_type,
            name,
            visibility,
            configuration,
            source_file,
            resolver: ResolverId::EMPTY,
            kind,
        }
    }

    /// Generic value item (`<string>`, `<color>`, `<dimen>`, `<item type="id">`, ...)
    pub fn value(
        resource_type: ResourceType,
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
        text: Option<String>,
        raw_xml: Option<String>,
    ) -> Self {
        Self::new(
            resource_type,
            name.into(),
            visibility,
            source.1,
            Some(source.0),
            ItemKind::Value { text, raw_xml },
        )
    }

    pub fn array(
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
        elements: Vec<String>,
        default_index: usize,
    ) -> Self {
        debug_assert!(elements.is_empty() || default_index < elements.len());
        Self::new(
            ResourceType::Array,
            name.into(),
            visibility,
            source.1,
            Some(source.0),
            ItemKind::Array {
                elements,
                default_index,
            },
        )
    }

    pub fn plurals(
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
        quantities: Vec<(Arity, String)>,
        default_index: usize,
    ) -> Self {
        debug_assert!(quantities.is_empty() || default_index < quantities.len());
        Self::new(
            ResourceType::Plurals,
            name.into(),
            visibility,
            source.1,
            Some(source.0),
            ItemKind::Plurals {
                quantities,
                default_index,
            },
        )
    }

    pub fn attr(
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
        definition: AttrDefinition,
    ) -> Self {
        Self::new(
            ResourceType::Attr,
            name.into(),
            visibility,
            source.1,
            Some(source.0),
            ItemKind::Attr(definition),
        )
    }

    pub fn attr_reference(
        name: impl Into<String>,
        source: (SourceFileId, ConfigId),
        reference: AttrReference,
    ) -> Self {
        Self::new(
            ResourceType::Attr,
            name.into(),
            ResourceVisibility::Public,
            source.1,
            Some(source.0),
            ItemKind::AttrReference(reference),
        )
    }

    /// Style item. Items setting the same attr twice keep the first
    /// definition; a conflicting redefinition is logged.
    pub fn style(
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
        parent: Option<String>,
        items: Vec<StyleItem>,
    ) -> Self {
        let name = name.into();
        let mut unique: IndexMap<(Option<ResourceNamespace>, String), StyleItem> = IndexMap::new();
        for item in items {
            let key = item.dedupe_key();
            match unique.get(&key) {
                Some(existing) => {
                    if existing.value != item.value {
                        warn!(
                            "Conflicting definitions of \"{}\" in style \"{}\"",
                            item.attr_name, name
                        );
                    }
                }
                None => {
                    unique.insert(key, item);
                }
            }
        }

        Self::new(
            ResourceType::Style,
            name,
            visibility,
            source.1,
            Some(source.0),
            ItemKind::Style {
                parent,
                items: unique.into_values().collect(),
            },
        )
    }

    pub fn styleable(
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
        attrs: Vec<ResourceItem>,
    ) -> Self {
        Self::new(
            ResourceType::Styleable,
            name.into(),
            visibility,
            source.1,
            Some(source.0),
            ItemKind::Styleable { attrs },
        )
    }

    /// File-based item; `source_file` is `None` because the file itself is
    /// the resource
    pub fn file(
        resource_type: ResourceType,
        name: impl Into<String>,
        visibility: ResourceVisibility,
        configuration: ConfigId,
        relative_path: String,
        density: Option<Density>,
    ) -> Self {
        Self::new(
            resource_type,
            name.into(),
            visibility,
            configuration,
            None,
            ItemKind::File {
                relative_path,
                density,
            },
        )
    }

    /// Item that only exists because R.txt declares it
    pub fn synthesized_id(
        name: impl Into<String>,
        visibility: ResourceVisibility,
        source: (SourceFileId, ConfigId),
    ) -> Self {
        Self::value(ResourceType::Id, name, visibility, source, None, None)
    }

    /// Attach the namespace scope the item was defined in
    pub fn with_resolver(mut self, resolver: ResolverId) -> Self {
        self.resolver = resolver;
        self
    }

    pub(crate) fn with_visibility(mut self, visibility: ResourceVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub(crate) fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> ResourceVisibility {
        self.visibility
    }

    pub fn configuration(&self) -> ConfigId {
        self.configuration
    }

    pub fn source_file(&self) -> Option<SourceFileId> {
        self.source_file
    }

    pub fn resolver(&self) -> ResolverId {
        self.resolver
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn is_file_based(&self) -> bool {
        matches!(self.kind, ItemKind::File { .. })
    }

    /// Value used when the item is referenced: the text of a value item, the
    /// default element of an array or plurals, the path of a file item
    pub fn resource_value(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Value { text, .. } => text.as_deref(),
            ItemKind::Array {
                elements,
                default_index,
            } => elements.get(*default_index).map(String::as_str),
            ItemKind::Plurals {
                quantities,
                default_index,
            } => quantities.get(*default_index).map(|(_, value)| value.as_str()),
            ItemKind::File { relative_path, .. } => Some(relative_path),
            _ => None,
        }
    }

    /// Raw XML of a string that contains markup
    pub fn raw_xml(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Value { raw_xml, .. } => raw_xml.as_deref(),
            _ => None,
        }
    }

    pub fn attr_definition(&self) -> Option<&AttrDefinition> {
        match &self.kind {
            ItemKind::Attr(definition) => Some(definition),
            _ => None,
        }
    }

    /// Description and group of an attr or attr reference
    pub fn attr_docs(&self) -> Option<(Option<&str>, Option<&str>)> {
        match &self.kind {
            ItemKind::Attr(definition) => Some((
                definition.description.as_deref(),
                definition.group_name.as_deref(),
            )),
            ItemKind::AttrReference(reference) => Some((
                reference.description.as_deref(),
                reference.group_name.as_deref(),
            )),
            _ => None,
        }
    }

    /// Value of a plurals item for one quantity
    pub fn quantity(&self, arity: Arity) -> Option<&str> {
        match &self.kind {
            ItemKind::Plurals { quantities, .. } => quantities
                .iter()
                .find(|(a, _)| *a == arity)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Style item setting `name` in `namespace`
    pub fn style_item(&self, namespace: &ResourceNamespace, name: &str) -> Option<&StyleItem> {
        match &self.kind {
            ItemKind::Style { items, .. } => items
                .iter()
                .find(|item| item.attr() == Some((namespace, name))),
            _ => None,
        }
    }

    pub fn style_parent(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Style { parent, .. } => parent.as_deref(),
            _ => None,
        }
    }

    pub fn styleable_attrs(&self) -> &[ResourceItem] {
        match &self.kind {
            ItemKind::Styleable { attrs } => attrs,
            _ => &[],
        }
    }
}

impl PartialEq for ResourceItem {
    fn eq(&self, other: &Self) -> bool {
        self.resource_type == other.resource_type
            && self.name == other.name
            && self.visibility == other.visibility
    }
}

impl Eq for ResourceItem {}

impl Hash for ResourceItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resource_type.ordinal().hash(state);
        self.name.hash(state);
        self.visibility.ordinal().hash(state);
    }
}
