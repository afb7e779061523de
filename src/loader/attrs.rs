use crate::resources::{
    AttrDefinition, AttributeFormats, ItemKind, ResourceError, ResourceItem, ResourceRepository, ResourceType,
};
use indexmap::IndexMap;
use tracing::trace;

/// Collects attr definitions and styleables across value files
#[derive(Debug, Default)]
pub struct AttrCollector {
    /// Top-level `<attr>` definitions by name
    attrs: IndexMap<String, Vec<ResourceItem>>,
    /// `<attr>` definitions nested in `<declare-styleable>`
    candidates: IndexMap<String, Vec<ResourceItem>>,
    styleables: Vec<ResourceItem>,
}

impl AttrCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attr(&mut self, attr: ResourceItem) {
        merge_attr(&mut self.attrs, attr);
    }

    pub fn add_candidate(&mut self, attr: ResourceItem) {
        merge_attr(&mut self.candidates, attr);
    }

    pub fn add_styleable(&mut self, styleable: ResourceItem) {
        self.styleables.push(styleable);
    }

    /// Add the collected attrs to the repository, then the styleables with
    /// their attr references resolved against those attrs
    pub fn finish(self, repository: &mut ResourceRepository) -> Result<(), ResourceError> {
        for attr in self.attrs.values().flatten() {
            repository.add_item(with_default_formats(attr.clone()))?;
        }

        for candidate in self.candidates.values().flatten() {
            let defined = self.attrs.get(candidate.name()).is_some_and(|attrs| {
                attrs
                    .iter()
                    .any(|attr| attr.configuration() == candidate.configuration())
            });
            if !defined {
                repository.add_item(with_default_formats(candidate.clone()))?;
            }
        }

        for styleable in self.styleables {
            let resolved = resolve_attr_references(styleable, repository);
            repository.add_item(resolved)?;
        }

        Ok(())
    }
}

fn formats_of(item: &ResourceItem) -> AttributeFormats {
    item.attr_definition()
        .map(|definition| definition.formats)
        .unwrap_or_default()
}

/// Add `attr` to `map`, merging it with a definition of the same name in
/// the same configuration: a definition with formats replaces one without,
/// and differing formats are unioned
fn merge_attr(map: &mut IndexMap<String, Vec<ResourceItem>>, attr: ResourceItem) {
    let definitions = map.entry(attr.name().to_string()).or_default();
    let Some(index) = definitions
        .iter()
        .position(|existing| existing.configuration() == attr.configuration())
    else {
        definitions.push(attr);
        return;
    };

    let new_formats = formats_of(&attr);
    if new_formats.is_empty() {
        return;
    }

    let existing = &definitions[index];
    let existing_formats = formats_of(existing);
    if existing_formats.is_empty() {
        definitions[index] = attr;
    } else if existing_formats != new_formats {
        trace!("Merging formats of attr {}", attr.name());
        if let Some(definition) = existing.attr_definition() {
            let merged = AttrDefinition {
                formats: existing_formats | new_formats,
                ..definition.clone()
            };
            definitions[index] = existing.clone().with_kind(ItemKind::Attr(merged));
        }
    }
}

/// An attr that never declares formats accepts the default set
fn with_default_formats(attr: ResourceItem) -> ResourceItem {
    match attr.attr_definition() {
        Some(definition) if definition.formats.is_empty() => {
            let adjusted = AttrDefinition {
                namespace: definition.namespace.clone(),
                description: definition.description.clone(),
                group_name: definition.group_name.clone(),
                formats: AttributeFormats::DEFAULT,
                ..AttrDefinition::default()
            };
            attr.with_kind(ItemKind::Attr(adjusted))
        }
        _ => attr,
    }
}

/// Replace the attr references of a styleable by the repository's attr
/// when it has the same description and group name
fn resolve_attr_references(styleable: ResourceItem, repository: &ResourceRepository) -> ResourceItem {
    let ItemKind::Styleable { attrs } = styleable.kind() else {
        return styleable;
    };

    let mut changed = false;
    let resolved: Vec<ResourceItem> = attrs
        .iter()
        .map(|attr| match canonical_attr(attr, repository) {
            Some(canonical) => {
                changed = true;
                canonical.clone()
            }
            None => attr.clone(),
        })
        .collect();

    if changed {
        styleable.with_kind(ItemKind::Styleable { attrs: resolved })
    } else {
        styleable
    }
}

fn canonical_attr<'a>(attr: &ResourceItem, repository: &'a ResourceRepository) -> Option<&'a ResourceItem> {
    let ItemKind::AttrReference(reference) = attr.kind() else {
        return None;
    };
    repository
        .get_resources_named(&reference.namespace, ResourceType::Attr, attr.name())
        .iter()
        .find(|candidate| {
            candidate.attr_definition().is_some()
                && candidate.attr_docs()
                    == Some((reference.description.as_deref(), reference.group_name.as_deref()))
        })
}
