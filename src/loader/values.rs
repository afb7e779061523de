use super::VisibilityLookup;
use crate::parser::xml::{extract_text, ValueResourceXmlParser, XmlToken};
use crate::resources::{
    AttrDefinition, AttrReference, AttributeFormats, Arity, ConfigId, ResolverId, ResourceError, ResourceItem,
    ResourceNamespace, ResourceRepository, ResourceType, ResourceUrl, ResourceVisibility, SourceFileId, StyleItem,
    TOOLS_URI,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::warn;

const TAG_RESOURCES: &str = "resources";
const TAG_ITEM: &str = "item";
const TAG_ATTR: &str = "attr";
const TAG_ENUM: &str = "enum";
const TAG_FLAG: &str = "flag";
const TAG_SKIP: &str = "skip";

const ATTR_NAME: &str = "name";
const ATTR_TYPE: &str = "type";
const ATTR_FORMAT: &str = "format";
const ATTR_VALUE: &str = "value";
const ATTR_PARENT: &str = "parent";
const ATTR_INDEX: &str = "index";
const ATTR_QUANTITY: &str = "quantity";

/// Optional `prefix:` followed by a Java-like identifier that may also
/// contain dots and dashes
static RESOURCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[\w.]+:)?[\p{L}_$][\p{L}\p{N}_$.\-]*$").expect("valid regex"));

/// Items read from one value file, ready to be added to the repository
#[derive(Debug, Default)]
pub struct ValueFileItems {
    /// Plain value items; a later definition of the same type and name
    /// replaces the earlier one
    pub items: IndexMap<(ResourceType, String), ResourceItem>,
    pub attrs: Vec<ResourceItem>,
    pub attr_candidates: Vec<ResourceItem>,
    pub styleables: Vec<ResourceItem>,
}

/// Turns the tags of a value file into resource items
pub struct ValueFileReader<'a> {
    parser: &'a mut ValueResourceXmlParser,
    repository: &'a mut ResourceRepository,
    visibility: &'a VisibilityLookup,
    source: (SourceFileId, ConfigId),
    namespace: ResourceNamespace,
    result: ValueFileItems,
}

impl<'a> ValueFileReader<'a> {
    /// The parser must already be positioned at the start of the file
    pub fn new(
        parser: &'a mut ValueResourceXmlParser,
        repository: &'a mut ResourceRepository,
        visibility: &'a VisibilityLookup,
        source: (SourceFileId, ConfigId),
    ) -> Self {
        let namespace = repository.namespace().clone();
        Self {
            parser,
            repository,
            visibility,
            source,
            namespace,
            result: ValueFileItems::default(),
        }
    }

    /// Read the whole file. Items completed before an error are kept in
    /// [`into_items`](Self::into_items).
    pub fn read(&mut self) -> Result<(), ResourceError> {
        loop {
            match self.parser.next_token()? {
                XmlToken::StartTag => {
                    let depth = self.parser.depth();
                    if depth == 1 {
                        if self.parser.prefix().is_some() || self.parser.name() != TAG_RESOURCES {
                            return Ok(());
                        }
                    } else if depth > 2 || self.parser.prefix().is_some() {
                        self.parser.skip_sub_tags()?;
                    } else {
                        self.read_resource_tag()?;
                    }
                }
                XmlToken::EndDocument => return Ok(()),
                _ => {}
            }
        }
    }

    pub fn into_items(self) -> ValueFileItems {
        self.result
    }

    fn read_resource_tag(&mut self) -> Result<(), ResourceError> {
        let resource_type = match self.resource_type() {
            Some(ResourceType::Public) | None => return self.parser.skip_sub_tags(),
            Some(resource_type) => resource_type,
        };
        let Some(name) = self.parser.attribute_value(None, ATTR_NAME).map(str::to_string) else {
            return self.parser.skip_sub_tags();
        };
        if !RESOURCE_NAME.is_match(&name) {
            return Err(self.parser.error(format!("'{}' is not a valid {} name", name, resource_type)));
        }

        match resource_type {
            ResourceType::Array => self.read_array(name),
            ResourceType::Attr => {
                let attr = self.read_attr(&name)?;
                self.result.attrs.push(attr);
                Ok(())
            }
            ResourceType::Plurals => self.read_plurals(name),
            ResourceType::Style => self.read_style(name),
            ResourceType::Styleable => self.read_styleable(name),
            ResourceType::String => self.read_text_value(resource_type, name, true),
            ResourceType::Id => {
                let resolver = self.current_resolver()?;
                self.parser.skip_sub_tags()?;
                let visibility = self.visibility_of(resource_type, &name);
                let item = ResourceItem::value(
                    resource_type,
                    name,
                    visibility,
                    self.source,
                    None,
                    None,
                );
                self.add_value(item.with_resolver(resolver));
                Ok(())
            }
            _ => self.read_text_value(resource_type, name, false),
        }
    }

    /// Type declared by the current tag; `<item>` takes it from its `type`
    /// attribute
    fn resource_type(&self) -> Option<ResourceType> {
        let tag = self.parser.name();
        if let Some(resource_type) = ResourceType::from_xml_tag_name(tag) {
            return Some(resource_type);
        }
        match tag {
            crate::parser::xml::TAG_EAT_COMMENT | TAG_SKIP => None,
            TAG_ITEM => {
                let type_name = self.parser.attribute_value(None, ATTR_TYPE)?;
                let resource_type = ResourceType::from_class_name(type_name);
                if resource_type.is_none() {
                    warn!(
                        "Unrecognized type attribute \"{}\" at {} line {}",
                        type_name,
                        self.parser.file().display(),
                        self.parser.line_number()
                    );
                }
                resource_type
            }
            _ => {
                warn!(
                    "Unrecognized tag name \"{}\" at {} line {}",
                    tag,
                    self.parser.file().display(),
                    self.parser.line_number()
                );
                None
            }
        }
    }

    fn current_resolver(&mut self) -> Result<ResolverId, ResourceError> {
        let resolver = self.parser.namespace_resolver()?;
        self.repository.intern_resolver(resolver)
    }

    fn add_value(&mut self, item: ResourceItem) {
        self.result
            .items
            .insert((item.resource_type(), item.name().to_string()), item);
    }

    fn visibility_of(&self, resource_type: ResourceType, name: &str) -> ResourceVisibility {
        self.visibility.visibility(resource_type, name)
    }

    fn read_text_value(&mut self, resource_type: ResourceType, name: String, with_raw_xml: bool) -> Result<(), ResourceError> {
        let resolver = self.current_resolver()?;
        let extracted = extract_text(self.parser, with_raw_xml)?;
        let text = if resource_type.is_file_reference() {
            extracted.text.trim().to_string()
        } else {
            extracted.text
        };
        let item = ResourceItem::value(
            resource_type,
            name.clone(),
            self.visibility_of(resource_type, &name),
            self.source,
            Some(text),
            extracted.raw_xml,
        );
        self.add_value(item.with_resolver(resolver));
        Ok(())
    }

    fn read_array(&mut self, name: String) -> Result<(), ResourceError> {
        let index_value = self
            .parser
            .attribute_value(Some(TOOLS_URI), ATTR_INDEX)
            .map(str::to_string);
        let resolver = self.current_resolver()?;

        let depth = self.parser.depth();
        let mut elements = Vec::new();
        while next_sub_tag(self.parser, depth, Some(TAG_ITEM))? {
            elements.push(extract_text(self.parser, false)?.text);
        }

        let mut default_index = 0;
        if let Some(index_value) = index_value {
            default_index = index_value.trim().parse::<usize>().map_err(|_| {
                self.parser
                    .error("The value of the tools:index attribute is not a valid number.")
            })?;
            if default_index >= elements.len() {
                return Err(self.parser.error("The value of the tools:index attribute is out of bounds."));
            }
        }

        let item = ResourceItem::array(
            name.clone(),
            self.visibility_of(ResourceType::Array, &name),
            self.source,
            elements,
            default_index,
        );
        self.add_value(item.with_resolver(resolver));
        Ok(())
    }

    fn read_plurals(&mut self, name: String) -> Result<(), ResourceError> {
        let default_quantity = self
            .parser
            .attribute_value(Some(TOOLS_URI), ATTR_QUANTITY)
            .map(str::to_string);
        let resolver = self.current_resolver()?;

        let depth = self.parser.depth();
        let mut values: BTreeMap<Arity, String> = BTreeMap::new();
        while next_sub_tag(self.parser, depth, Some(TAG_ITEM))? {
            let arity = self
                .parser
                .attribute_value(None, ATTR_QUANTITY)
                .and_then(Arity::from_name);
            if let Some(arity) = arity {
                let text = extract_text(self.parser, false)?.text;
                values.insert(arity, text);
            }
        }

        let quantities: Vec<(Arity, String)> = values.into_iter().collect();
        let default_index = match default_quantity {
            Some(quantity) => Arity::from_name(quantity.trim())
                .and_then(|arity| quantities.iter().position(|(a, _)| *a == arity))
                .ok_or_else(|| self.parser.error("Invalid value of the tools:quantity attribute."))?,
            None => quantities
                .iter()
                .position(|(arity, _)| *arity == Arity::Other)
                .unwrap_or(0),
        };

        let item = ResourceItem::plurals(
            name.clone(),
            self.visibility_of(ResourceType::Plurals, &name),
            self.source,
            quantities,
            default_index,
        );
        self.add_value(item.with_resolver(resolver));
        Ok(())
    }

    fn read_style(&mut self, name: String) -> Result<(), ResourceError> {
        let parent = self
            .parser
            .attribute_value(None, ATTR_PARENT)
            .filter(|parent| !parent.is_empty())
            .map(|parent| match ResourceUrl::parse_style_parent_reference(parent) {
                Some(url) => url.qualified_name(),
                None => parent.to_string(),
            });
        let resolver = self.current_resolver()?;

        let depth = self.parser.depth();
        let mut items = Vec::new();
        while next_sub_tag(self.parser, depth, Some(TAG_ITEM))? {
            let item_resolver = self.parser.namespace_resolver()?;
            let Some(attr_name) = self.parser.attribute_value(None, ATTR_NAME).map(str::to_string) else {
                continue;
            };
            let item_resolver_id = self.repository.intern_resolver(item_resolver.clone())?;
            let text = extract_text(self.parser, false)?.text;
            items.push(StyleItem::new(
                attr_name,
                Some(text),
                item_resolver_id,
                &item_resolver,
                &self.namespace,
            ));
        }

        let item = ResourceItem::style(
            name.clone(),
            self.visibility_of(ResourceType::Style, &name),
            self.source,
            parent,
            items,
        );
        self.add_value(item.with_resolver(resolver));
        Ok(())
    }

    fn read_styleable(&mut self, name: String) -> Result<(), ResourceError> {
        let resolver = self.current_resolver()?;

        let depth = self.parser.depth();
        let mut attrs = Vec::new();
        while next_sub_tag(self.parser, depth, Some(TAG_ATTR))? {
            let Some(attr_name) = self.parser.attribute_value(None, ATTR_NAME).map(str::to_string) else {
                continue;
            };
            let attr = match self.read_attr(&attr_name) {
                Ok(attr) => attr,
                Err(e @ ResourceError::Xml { .. }) if self.parser.token() == XmlToken::StartTag => {
                    warn!("{}", e);
                    self.parser.skip_sub_tags()?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(definition) = attr.attr_definition() else {
                continue;
            };
            let attr_namespace = definition
                .namespace
                .clone()
                .unwrap_or_else(|| self.namespace.clone());
            attrs.push(
                ResourceItem::attr_reference(
                    attr.name().to_string(),
                    self.source,
                    AttrReference {
                        namespace: attr_namespace.clone(),
                        description: definition.description.clone(),
                        group_name: definition.group_name.clone(),
                    },
                )
                .with_resolver(attr.resolver()),
            );

            // A format-less res-auto attr may be defined by another library
            if attr_namespace == self.namespace
                && (self.namespace != ResourceNamespace::ResAuto || !definition.formats.is_empty())
            {
                self.result.attr_candidates.push(attr);
            }
        }

        let item = ResourceItem::styleable(name, ResourceVisibility::Public, self.source, attrs);
        self.result.styleables.push(item.with_resolver(resolver));
        Ok(())
    }

    /// Read an `<attr>` tag and its `<enum>`/`<flag>` children
    fn read_attr(&mut self, qualified_name: &str) -> Result<ResourceItem, ResourceError> {
        let resolver = self.parser.namespace_resolver()?;
        let url = ResourceUrl::parse_attr_reference(qualified_name).ok_or_else(|| {
            self.parser
                .error(format!("Invalid attr resource name \"{}\"", qualified_name))
        })?;
        let attr_namespace = ResourceNamespace::from_prefix(url.namespace.as_deref(), &self.namespace, &resolver)
            .ok_or_else(|| {
                self.parser
                    .error(format!("Undefined prefix of attr resource name \"{}\"", qualified_name))
            })?;

        let resolver_id = self.repository.intern_resolver(resolver)?;
        let description = self.parser.last_comment().map(str::to_string);
        let group_name = self.parser.attr_group_comment().map(str::to_string);
        let mut formats = self
            .parser
            .attribute_value(None, ATTR_FORMAT)
            .map(AttributeFormats::parse)
            .unwrap_or_default();

        let depth = self.parser.depth();
        let mut values = IndexMap::new();
        let mut value_descriptions = IndexMap::new();
        while next_sub_tag(self.parser, depth, None)? {
            if self.parser.prefix().is_some() {
                self.parser.skip_sub_tags()?;
                continue;
            }
            let format = match self.parser.name() {
                TAG_ENUM => AttributeFormats::ENUM,
                TAG_FLAG => AttributeFormats::FLAGS,
                _ => {
                    self.parser.skip_sub_tags()?;
                    continue;
                }
            };
            formats |= format;
            let Some(value_name) = self.parser.attribute_value(None, ATTR_NAME).map(str::to_string) else {
                continue;
            };
            if let Some(description) = self.parser.last_comment() {
                value_descriptions.insert(value_name.clone(), description.to_string());
            }
            let numeric = self.parser.attribute_value(None, ATTR_VALUE).and_then(decode_int);
            values.insert(value_name, numeric);
        }

        let foreign = attr_namespace != self.namespace;
        let visibility = if foreign {
            ResourceVisibility::Public
        } else {
            self.visibility_of(ResourceType::Attr, &url.name)
        };
        let definition = AttrDefinition {
            namespace: foreign.then_some(attr_namespace),
            description,
            group_name,
            formats,
            values,
            value_descriptions,
        };
        Ok(ResourceItem::attr(url.name, visibility, self.source, definition).with_resolver(resolver_id))
    }
}

/// Advance to the next child start tag of the element at `depth`, named
/// `tag_name` when given. Returns `false` at the element's end tag.
fn next_sub_tag(
    parser: &mut ValueResourceXmlParser,
    depth: usize,
    tag_name: Option<&str>,
) -> Result<bool, ResourceError> {
    loop {
        match parser.next_token()? {
            XmlToken::StartTag => {
                let matches = match tag_name {
                    Some(tag_name) => parser.name() == tag_name && parser.prefix().is_none(),
                    None => true,
                };
                if matches {
                    return Ok(true);
                }
                parser.skip_sub_tags()?;
            }
            XmlToken::EndTag if parser.depth() <= depth => return Ok(false),
            XmlToken::EndDocument => return Ok(false),
            _ => {}
        }
    }
}

/// Decode a decimal, hex (`0x`, `#`) or octal integer, keeping the low
/// 32 bits so that `0xFFFFFFFF` is -1
fn decode_int(value: &str) -> Option<i32> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let parsed = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .or_else(|| digits.strip_prefix('#'))
    {
        i64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<i64>()
    }
    .ok()?;
    Some(if negative { -parsed } else { parsed } as i32)
}
