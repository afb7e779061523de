//! Binary encoding of a frozen repository.
//!
//! Layout of the body:
//!
//! ```text
//! string table   count, then length-prefixed UTF-8 strings
//! repository     namespace, library name, origin
//! configurations count, then qualifier strings
//! source files   count, then (relative path, configuration index)
//! resolvers      count, then binding lists of (prefix, uri)
//! items          count, then item records
//! ```
//!
//! Strings are referenced by their table index; optional strings use
//! index + 1 with 0 for none. Each item record starts with
//! `(type ordinal << 1) | file bit`, followed by the name, the visibility
//! ordinal, the configuration index and the variant payload.

use super::base128::{Base128Input, Base128Output};
use super::CacheError;
use crate::resources::{
    AttrDefinition, AttrReference, Arity, AttributeFormats, ConfigId, Density, FolderConfiguration, ItemKind,
    NamespaceResolver, RepositoryConfiguration, ResolverId, ResourceItem, ResourceNamespace, ResourceRepository,
    ResourceType, ResourceVisibility, SourceFileId, StyleItem,
};
use indexmap::{IndexMap, IndexSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Interns strings while the body is written
#[derive(Default)]
struct StringTable {
    strings: IndexSet<String>,
}

impl StringTable {
    fn index(&mut self, value: &str) -> u32 {
        match self.strings.get_index_of(value) {
            Some(index) => index as u32,
            None => self.strings.insert_full(value.to_string()).0 as u32,
        }
    }

    fn write(&mut self, out: &mut Base128Output, value: &str) {
        let index = self.index(value);
        out.write_u32(index);
    }

    fn write_opt(&mut self, out: &mut Base128Output, value: Option<&str>) {
        match value {
            Some(value) => {
                let index = self.index(value);
                out.write_u32(index + 1);
            }
            None => out.write_u32(0),
        }
    }
}

/// Encode a frozen repository
pub fn encode_repository(repository: &ResourceRepository) -> Result<Vec<u8>, CacheError> {
    if !repository.is_frozen() {
        return Err(CacheError::NotFrozen);
    }

    let mut strings = StringTable::default();
    let mut body = Base128Output::new();

    strings.write(&mut body, &repository.namespace().to_string());
    strings.write_opt(&mut body, repository.library_name());
    strings.write(&mut body, &repository.origin().to_string_lossy());

    body.write_usize(repository.configurations().len());
    for configuration in repository.configurations() {
        strings.write(&mut body, &configuration.folder_configuration().qualifier_string());
    }

    body.write_usize(repository.source_files().len());
    for source_file in repository.source_files() {
        strings.write_opt(&mut body, source_file.relative_path.as_deref());
        body.write_usize(source_file.configuration.index());
    }

    body.write_usize(repository.resolvers().len());
    for resolver in repository.resolvers() {
        body.write_usize(resolver.namespace_count());
        for (prefix, uri) in resolver.bindings() {
            strings.write(&mut body, prefix);
            strings.write(&mut body, uri);
        }
    }

    body.write_usize(repository.item_count());
    for item in repository.all_items() {
        encode_item(item, &mut strings, &mut body);
    }

    let mut out = Base128Output::new();
    out.write_usize(strings.strings.len());
    for string in &strings.strings {
        out.write_str(string);
    }
    out.write_raw(&body.into_bytes());
    Ok(out.into_bytes())
}

fn encode_item(item: &ResourceItem, strings: &mut StringTable, out: &mut Base128Output) {
    let file_bit = u32::from(item.is_file_based());
    out.write_u32((item.resource_type().ordinal() << 1) | file_bit);
    strings.write(out, item.name());
    out.write_u32(item.visibility().ordinal());
    out.write_usize(item.configuration().index());

    if let ItemKind::File {
        relative_path,
        density,
    } = item.kind()
    {
        strings.write(out, relative_path);
        out.write_u32(density.map_or(0, |density| density.dpi() + 1));
        return;
    }

    out.write_usize(item.source_file().map_or(0, |id| id.index() + 1));
    out.write_usize(item.resolver().index());

    match item.kind() {
        ItemKind::Value { text, raw_xml } => {
            strings.write_opt(out, text.as_deref());
            strings.write_opt(out, raw_xml.as_deref());
        }
        ItemKind::Array {
            elements,
            default_index,
        } => {
            out.write_usize(elements.len());
            for element in elements {
                strings.write(out, element);
            }
            out.write_usize(*default_index);
        }
        ItemKind::Plurals {
            quantities,
            default_index,
        } => {
            out.write_usize(quantities.len());
            for (arity, value) in quantities {
                out.write_u32(arity.ordinal());
                strings.write(out, value);
            }
            out.write_usize(*default_index);
        }
        ItemKind::Attr(definition) => {
            let namespace = definition.namespace.as_ref().map(ToString::to_string);
            strings.write_opt(out, namespace.as_deref());
            strings.write_opt(out, definition.description.as_deref());
            strings.write_opt(out, definition.group_name.as_deref());
            out.write_u32(definition.formats.bits());
            out.write_usize(definition.values.len());
            for (name, value) in &definition.values {
                strings.write(out, name);
                match value {
                    Some(value) => {
                        out.write_bool(true);
                        out.write_i32(*value);
                    }
                    None => out.write_bool(false),
                }
            }
            out.write_usize(definition.value_descriptions.len());
            for (name, description) in &definition.value_descriptions {
                strings.write(out, name);
                strings.write(out, description);
            }
        }
        // A reference is an attr without formats or values
        ItemKind::AttrReference(reference) => {
            strings.write_opt(out, Some(reference.namespace.to_string().as_str()));
            strings.write_opt(out, reference.description.as_deref());
            strings.write_opt(out, reference.group_name.as_deref());
            out.write_u32(0);
            out.write_usize(0);
            out.write_usize(0);
        }
        ItemKind::Style { parent, items } => {
            strings.write_opt(out, parent.as_deref());
            out.write_usize(items.len());
            for style_item in items {
                strings.write(out, style_item.attr_name());
                strings.write_opt(out, style_item.value());
                out.write_usize(style_item.resolver().index());
            }
        }
        ItemKind::Styleable { attrs } => {
            out.write_usize(attrs.len());
            for attr in attrs {
                encode_item(attr, strings, out);
            }
        }
        ItemKind::File { .. } => {}
    }
}

/// Tables of the repository under construction, indexed by their position
/// in the stream
struct DecodeContext<'a> {
    strings: Vec<&'a str>,
    configurations: Vec<ConfigId>,
    source_files: Vec<SourceFileId>,
    resolvers: Vec<(ResolverId, Arc<NamespaceResolver>)>,
    namespace: ResourceNamespace,
}

impl<'a> DecodeContext<'a> {
    fn string(&self, input: &mut Base128Input<'a>) -> Result<&'a str, CacheError> {
        let index = input.read_usize()?;
        self.strings
            .get(index)
            .copied()
            .ok_or(CacheError::InvalidFormat("string index out of range"))
    }

    fn opt_string(&self, input: &mut Base128Input<'a>) -> Result<Option<&'a str>, CacheError> {
        match input.read_usize()? {
            0 => Ok(None),
            index => self
                .strings
                .get(index - 1)
                .copied()
                .map(Some)
                .ok_or(CacheError::InvalidFormat("string index out of range")),
        }
    }

    fn configuration(&self, input: &mut Base128Input<'a>) -> Result<ConfigId, CacheError> {
        let index = input.read_usize()?;
        self.configurations
            .get(index)
            .copied()
            .ok_or(CacheError::InvalidFormat("configuration index out of range"))
    }

    fn resolver(&self, input: &mut Base128Input<'a>) -> Result<&(ResolverId, Arc<NamespaceResolver>), CacheError> {
        let index = input.read_usize()?;
        self.resolvers
            .get(index)
            .ok_or(CacheError::InvalidFormat("resolver index out of range"))
    }
}

/// Decode a repository written by [`encode_repository`]. The result is
/// frozen; any structural problem fails the whole decode.
pub fn decode_repository(input: &mut Base128Input<'_>) -> Result<ResourceRepository, CacheError> {
    let string_count = input.read_count()?;
    let mut strings = Vec::with_capacity(string_count);
    for _ in 0..string_count {
        strings.push(input.read_str()?);
    }

    let mut context = DecodeContext {
        strings,
        configurations: Vec::new(),
        source_files: Vec::new(),
        resolvers: Vec::new(),
        namespace: ResourceNamespace::ResAuto,
    };

    context.namespace = ResourceNamespace::parse(context.string(input)?);
    let library_name = context.opt_string(input)?.map(str::to_string);
    let origin = PathBuf::from(context.string(input)?);
    let mut repository = ResourceRepository::new(origin, context.namespace.clone(), library_name);

    let configuration_count = input.read_count()?;
    for _ in 0..configuration_count {
        let qualifiers = context.string(input)?;
        let folder_configuration = FolderConfiguration::from_qualifier_string(qualifiers)
            .ok_or(CacheError::InvalidFormat("invalid folder configuration"))?;
        let id = repository.adopt_configuration(RepositoryConfiguration::new(repository.id(), folder_configuration))?;
        context.configurations.push(id);
    }

    let source_file_count = input.read_count()?;
    for _ in 0..source_file_count {
        let relative_path = context.opt_string(input)?.map(str::to_string);
        let configuration = context.configuration(input)?;
        let id = repository.add_source_file(relative_path, configuration)?;
        context.source_files.push(id);
    }

    let resolver_count = input.read_count()?;
    for _ in 0..resolver_count {
        let binding_count = input.read_count()?;
        let mut bindings = Vec::with_capacity(binding_count);
        for _ in 0..binding_count {
            let prefix = context.string(input)?.to_string();
            let uri = context.string(input)?.to_string();
            bindings.push((prefix, uri));
        }
        let resolver = Arc::new(NamespaceResolver::new(bindings));
        let id = repository.intern_resolver(resolver.clone())?;
        context.resolvers.push((id, resolver));
    }

    let item_count = input.read_count()?;
    for _ in 0..item_count {
        let item = decode_item(input, &context)?;
        repository.add_item(item)?;
    }

    if !input.is_at_end() {
        return Err(CacheError::InvalidFormat("trailing bytes after items"));
    }

    repository.freeze();
    Ok(repository)
}

fn decode_item<'a>(input: &mut Base128Input<'a>, context: &DecodeContext<'a>) -> Result<ResourceItem, CacheError> {
    let tag = input.read_u32()?;
    let resource_type =
        ResourceType::from_ordinal(tag >> 1).ok_or(CacheError::InvalidFormat("resource type out of range"))?;
    let is_file = tag & 1 == 1;
    let name = context.string(input)?.to_string();
    let visibility = ResourceVisibility::from_ordinal(input.read_u32()?)
        .ok_or(CacheError::InvalidFormat("visibility out of range"))?;
    let configuration = context.configuration(input)?;

    if is_file {
        let relative_path = context.string(input)?.to_string();
        let density = match input.read_u32()? {
            0 => None,
            encoded => Some(Density::from_dpi(encoded - 1).ok_or(CacheError::InvalidFormat("invalid density"))?),
        };
        return Ok(ResourceItem::file(
            resource_type,
            name,
            visibility,
            configuration,
            relative_path,
            density,
        ));
    }

    let source_file = match input.read_usize()? {
        0 => return Err(CacheError::InvalidFormat("value item without source file")),
        index => *context
            .source_files
            .get(index - 1)
            .ok_or(CacheError::InvalidFormat("source file index out of range"))?,
    };
    let source = (source_file, configuration);
    let (resolver_id, _) = context.resolver(input)?;

    let item = match resource_type {
        ResourceType::Array => {
            let count = input.read_count()?;
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                elements.push(context.string(input)?.to_string());
            }
            let default_index = input.read_usize()?;
            if !elements.is_empty() && default_index >= elements.len() {
                return Err(CacheError::InvalidFormat("array default index out of range"));
            }
            ResourceItem::array(name, visibility, source, elements, default_index)
        }
        ResourceType::Plurals => {
            let count = input.read_count()?;
            let mut quantities = Vec::with_capacity(count);
            for _ in 0..count {
                let arity =
                    Arity::from_ordinal(input.read_u32()?).ok_or(CacheError::InvalidFormat("arity out of range"))?;
                quantities.push((arity, context.string(input)?.to_string()));
            }
            let default_index = input.read_usize()?;
            if !quantities.is_empty() && default_index >= quantities.len() {
                return Err(CacheError::InvalidFormat("plurals default index out of range"));
            }
            ResourceItem::plurals(name, visibility, source, quantities, default_index)
        }
        ResourceType::Attr => decode_attr(input, context, name, visibility, source)?,
        ResourceType::Style => {
            let parent = context.opt_string(input)?.map(str::to_string);
            let count = input.read_count()?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let attr_name = context.string(input)?.to_string();
                let value = context.opt_string(input)?.map(str::to_string);
                let (item_resolver_id, item_resolver) = context.resolver(input)?;
                items.push(StyleItem::new(
                    attr_name,
                    value,
                    *item_resolver_id,
                    item_resolver,
                    &context.namespace,
                ));
            }
            ResourceItem::style(name, visibility, source, parent, items)
        }
        ResourceType::Styleable => {
            let count = input.read_count()?;
            let mut attrs = Vec::with_capacity(count);
            for _ in 0..count {
                let attr = decode_item(input, context)?;
                if attr.resource_type() != ResourceType::Attr {
                    return Err(CacheError::InvalidFormat("styleable child is not an attr"));
                }
                attrs.push(attr);
            }
            ResourceItem::styleable(name, visibility, source, attrs)
        }
        _ => {
            let text = context.opt_string(input)?.map(str::to_string);
            let raw_xml = context.opt_string(input)?.map(str::to_string);
            ResourceItem::value(resource_type, name, visibility, source, text, raw_xml)
        }
    };

    Ok(item.with_resolver(*resolver_id))
}

fn decode_attr<'a>(
    input: &mut Base128Input<'a>,
    context: &DecodeContext<'a>,
    name: String,
    visibility: ResourceVisibility,
    source: (SourceFileId, ConfigId),
) -> Result<ResourceItem, CacheError> {
    let namespace = context.opt_string(input)?.map(ResourceNamespace::parse);
    let description = context.opt_string(input)?.map(str::to_string);
    let group_name = context.opt_string(input)?.map(str::to_string);
    let formats = AttributeFormats::from_bits(input.read_u32()?)
        .ok_or(CacheError::InvalidFormat("unknown attribute format"))?;

    let value_count = input.read_count()?;
    let mut values = IndexMap::with_capacity(value_count);
    for _ in 0..value_count {
        let value_name = context.string(input)?.to_string();
        let value = if input.read_bool()? {
            Some(input.read_i32()?)
        } else {
            None
        };
        values.insert(value_name, value);
    }

    let description_count = input.read_count()?;
    let mut value_descriptions = IndexMap::with_capacity(description_count);
    for _ in 0..description_count {
        let value_name = context.string(input)?.to_string();
        value_descriptions.insert(value_name, context.string(input)?.to_string());
    }

    if formats.is_empty() && values.is_empty() {
        let reference = AttrReference {
            namespace: namespace.unwrap_or_else(|| context.namespace.clone()),
            description,
            group_name,
        };
        return Ok(ResourceItem::attr_reference(name, source, reference).with_visibility(visibility));
    }

    let definition = AttrDefinition {
        namespace,
        description,
        group_name,
        formats,
        values,
        value_descriptions,
    };
    Ok(ResourceItem::attr(name, visibility, source, definition))
}
