//! Pull parser for value resource files.
//!
//! Wraps quick-xml with a token-at-a-time interface that keeps track of
//! element depth, the namespace scopes of the open elements, the last
//! comment before a tag and the current attr group comment.

use crate::resources::{NamespaceResolver, ResourceError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Comments longer than this before `<eat-comment/>` are documentation,
/// not attr group names
const ATTR_GROUP_MAX_CHARACTERS: usize = 40;

pub const TAG_EAT_COMMENT: &str = "eat-comment";

/// Kind of the token the parser is positioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlToken {
    StartDocument,
    StartTag,
    EndTag,
    Text,
    CData,
    Comment,
    /// XML declaration, processing instruction or doctype
    Other,
    EndDocument,
}

#[derive(Debug, Clone)]
struct XmlAttribute {
    prefix: Option<String>,
    name: String,
    value: String,
}

/// Namespace scopes of the open elements, innermost last.
///
/// A scope is only opened by elements that declare at least one `xmlns`
/// attribute and is closed by the end tag of that same element.
#[derive(Debug, Default)]
pub struct NamespaceScopes {
    entries: Vec<(usize, Arc<NamespaceResolver>)>,
}

impl NamespaceScopes {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolver of the innermost scope
    pub fn current(&self) -> Option<&Arc<NamespaceResolver>> {
        self.entries.last().map(|(_, resolver)| resolver)
    }

    fn push(&mut self, depth: usize, resolver: Arc<NamespaceResolver>) {
        self.entries.push((depth, resolver));
    }

    /// Close the scope opened at `depth`, if any
    fn close(&mut self, depth: usize) -> Result<(), ResourceError> {
        match self.entries.last() {
            Some((scope_depth, _)) if *scope_depth == depth => {
                self.entries.pop();
                Ok(())
            }
            Some((scope_depth, _)) if *scope_depth > depth => Err(ResourceError::UnbalancedScope),
            _ => Ok(()),
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Streaming parser over one value resource file at a time.
///
/// The resolver cache survives [`set_input`](Self::set_input), so resolvers
/// are shared across all files parsed by one parser.
pub struct ValueResourceXmlParser {
    reader: Option<Reader<Cursor<Vec<u8>>>>,
    file: PathBuf,
    buf: Vec<u8>,
    token: XmlToken,
    depth: usize,
    open_elements: Vec<(Option<String>, String)>,
    prefix: Option<String>,
    name: String,
    raw_tag: String,
    attributes: Vec<XmlAttribute>,
    text: String,
    pending_end: bool,
    scopes: NamespaceScopes,
    resolver_cache: HashMap<NamespaceResolver, Arc<NamespaceResolver>>,
    empty_resolver: Arc<NamespaceResolver>,
    last_comment: Option<String>,
    tag_after_comment: bool,
    attr_group_comments: Vec<Option<String>>,
}

impl Default for ValueResourceXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueResourceXmlParser {
    pub fn new() -> Self {
        Self {
            reader: None,
            file: PathBuf::new(),
            buf: Vec::new(),
            token: XmlToken::StartDocument,
            depth: 0,
            open_elements: Vec::new(),
            prefix: None,
            name: String::new(),
            raw_tag: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            pending_end: false,
            scopes: NamespaceScopes::default(),
            resolver_cache: HashMap::new(),
            empty_resolver: Arc::new(NamespaceResolver::EMPTY),
            last_comment: None,
            tag_after_comment: false,
            attr_group_comments: vec![None],
        }
    }

    /// Start parsing a new document; `file` is only used in error messages
    pub fn set_input(&mut self, file: &Path, contents: impl Into<Vec<u8>>) {
        let mut reader = Reader::from_reader(Cursor::new(contents.into()));
        reader.trim_text(false);
        reader.check_end_names(true);

        self.reader = Some(reader);
        self.file = file.to_path_buf();
        self.token = XmlToken::StartDocument;
        self.depth = 0;
        self.open_elements.clear();
        self.prefix = None;
        self.name.clear();
        self.raw_tag.clear();
        self.attributes.clear();
        self.text.clear();
        self.pending_end = false;
        self.scopes.clear();
        self.last_comment = None;
        self.tag_after_comment = false;
        self.attr_group_comments.clear();
        self.attr_group_comments.push(None);
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Advance to the next token, whitespace and comments included
    pub fn next_token(&mut self) -> Result<XmlToken, ResourceError> {
        if self.token == XmlToken::EndTag {
            self.depth = self.depth.saturating_sub(1);
        }
        if self.token == XmlToken::EndDocument {
            return Ok(XmlToken::EndDocument);
        }

        if self.pending_end {
            self.pending_end = false;
            self.enter_end_tag()?;
            return Ok(self.token);
        }

        let Some(reader) = self.reader.as_mut() else {
            self.token = XmlToken::EndDocument;
            return Ok(self.token);
        };

        self.buf.clear();
        let event = match reader.read_event_into(&mut self.buf) {
            Ok(event) => event.into_owned(),
            Err(e) => return Err(self.error(format!("{}", e))),
        };

        match event {
            Event::Start(e) => self.enter_start_tag(&e)?,
            Event::Empty(e) => {
                self.enter_start_tag(&e)?;
                self.pending_end = true;
            }
            Event::End(_) => self.enter_end_tag()?,
            Event::Text(e) => {
                self.text = e
                    .unescape()
                    .map_err(|err| self.error(format!("{}", err)))?
                    .into_owned();
                self.token = XmlToken::Text;
            }
            Event::CData(e) => {
                self.text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                self.token = XmlToken::CData;
            }
            Event::Comment(e) => {
                self.text = String::from_utf8_lossy(&e).into_owned();
                self.token = XmlToken::Comment;
                self.track_comment();
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                self.token = XmlToken::Other;
            }
            Event::Eof => {
                if !self.open_elements.is_empty() {
                    return Err(self.error("unexpected end of document"));
                }
                self.token = XmlToken::EndDocument;
            }
        }

        Ok(self.token)
    }

    fn enter_start_tag(&mut self, e: &BytesStart<'_>) -> Result<(), ResourceError> {
        let (prefix, name) = split_qname(e.name().as_ref());
        self.raw_tag = String::from_utf8_lossy(e).into_owned();
        self.attributes.clear();
        self.text.clear();

        let mut declared: Vec<(String, String)> = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(format!("{}", err)))?;
            let key = attr.key.as_ref();
            let value = attr
                .unescape_value()
                .map_err(|err| self.error(format!("{}", err)))?
                .into_owned();

            if key == b"xmlns" {
                declared.push((String::new(), value));
            } else if let Some(declared_prefix) = key.strip_prefix(b"xmlns:") {
                declared.push((String::from_utf8_lossy(declared_prefix).into_owned(), value));
            } else {
                let (attr_prefix, attr_name) = split_qname(key);
                self.attributes.push(XmlAttribute {
                    prefix: attr_prefix,
                    name: attr_name,
                    value,
                });
            }
        }

        self.depth += 1;
        self.prefix = prefix;
        self.name = name;
        self.open_elements.push((self.prefix.clone(), self.name.clone()));
        self.token = XmlToken::StartTag;

        if !declared.is_empty() {
            let resolver = self.intern_scope(declared);
            self.scopes.push(self.depth, resolver);
        }

        self.track_start_tag();
        Ok(())
    }

    fn enter_end_tag(&mut self) -> Result<(), ResourceError> {
        let (prefix, name) = self
            .open_elements
            .pop()
            .ok_or_else(|| self.error("unexpected end tag"))?;
        self.prefix = prefix;
        self.name = name;
        self.attributes.clear();
        self.text.clear();
        self.token = XmlToken::EndTag;

        self.scopes.close(self.depth)?;
        self.last_comment = None;
        if self.attr_group_comments.len() > 1 {
            self.attr_group_comments.pop();
        }
        Ok(())
    }

    /// Build the cumulative bindings for a scope, innermost declarations
    /// first, and reuse a cached resolver for an identical binding set
    fn intern_scope(&mut self, declared: Vec<(String, String)>) -> Arc<NamespaceResolver> {
        let mut bindings: Vec<(String, String)> = declared.into_iter().rev().collect();
        if let Some(parent) = self.scopes.current() {
            for (prefix, uri) in parent.bindings() {
                if !bindings.iter().any(|(p, _)| p == prefix) {
                    bindings.push((prefix.to_string(), uri.to_string()));
                }
            }
        }

        let resolver = NamespaceResolver::new(bindings);
        if let Some(cached) = self.resolver_cache.get(&resolver) {
            return cached.clone();
        }
        let shared = Arc::new(resolver.clone());
        self.resolver_cache.insert(resolver, shared.clone());
        shared
    }

    fn track_start_tag(&mut self) {
        if self.tag_after_comment {
            self.last_comment = None;
        }
        self.tag_after_comment = true;

        let inherited = self.attr_group_comments.last().cloned().flatten();
        self.attr_group_comments.push(inherited);

        if self.name == TAG_EAT_COMMENT && self.prefix.is_none() {
            if let Some(comment) = &self.last_comment {
                if comment.chars().count() <= ATTR_GROUP_MAX_CHARACTERS && !comment.starts_with("TODO:") {
                    let group = comment.strip_suffix('.').unwrap_or(comment).to_string();
                    let parent = self.attr_group_comments.len() - 2;
                    self.attr_group_comments[parent] = Some(group);
                }
            }
        }
    }

    fn track_comment(&mut self) {
        let comment = self.text.trim();
        if comment.is_empty() || comment.starts_with('*') || comment.starts_with('=') {
            return;
        }
        self.last_comment = Some(comment.to_string());
        self.tag_after_comment = false;
    }

    pub fn token(&self) -> XmlToken {
        self.token
    }

    /// Depth of the current element; the root element is at depth 1
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Local name of the current start or end tag
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Text of the current text, CDATA or comment token
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current start tag as written, without the angle brackets
    pub fn raw_tag(&self) -> &str {
        &self.raw_tag
    }

    /// Value of an attribute of the current start tag. `namespace_uri` is
    /// `None` for unprefixed attributes.
    pub fn attribute_value(&self, namespace_uri: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| {
                attr.name == name
                    && match (namespace_uri, attr.prefix.as_deref()) {
                        (None, None) => true,
                        (Some(uri), Some(prefix)) => self
                            .scopes
                            .current()
                            .and_then(|resolver| resolver.prefix_to_uri(prefix))
                            == Some(uri),
                        _ => false,
                    }
            })
            .map(|attr| attr.value.as_str())
    }

    /// Namespace bindings visible at the current start tag.
    ///
    /// Fails with [`ResourceError::CheckFailed`] on any other token.
    pub fn namespace_resolver(&self) -> Result<Arc<NamespaceResolver>, ResourceError> {
        if self.token != XmlToken::StartTag {
            return Err(ResourceError::CheckFailed);
        }
        Ok(self
            .scopes
            .current()
            .cloned()
            .unwrap_or_else(|| self.empty_resolver.clone()))
    }

    pub fn scopes(&self) -> &NamespaceScopes {
        &self.scopes
    }

    /// Number of distinct binding sets seen by this parser
    pub fn resolver_cache_len(&self) -> usize {
        self.resolver_cache.len()
    }

    /// Last comment before the current tag, ASCII art excluded
    pub fn last_comment(&self) -> Option<&str> {
        self.last_comment.as_deref()
    }

    /// Name of the attr group the current tag belongs to
    pub fn attr_group_comment(&self) -> Option<&str> {
        self.attr_group_comments.last().and_then(|c| c.as_deref())
    }

    /// Skip to the end tag of the current element
    pub fn skip_sub_tags(&mut self) -> Result<(), ResourceError> {
        if self.token != XmlToken::StartTag {
            return Ok(());
        }
        let depth = self.depth;
        loop {
            match self.next_token()? {
                XmlToken::EndTag if self.depth == depth => return Ok(()),
                XmlToken::EndDocument => return Ok(()),
                _ => {}
            }
        }
    }

    /// 1-based line of the parser position
    pub fn line_number(&self) -> usize {
        self.reader
            .as_ref()
            .map(|reader| {
                let position = reader.buffer_position().min(reader.get_ref().get_ref().len());
                reader.get_ref().get_ref()[..position]
                    .iter()
                    .filter(|b| **b == b'\n')
                    .count()
                    + 1
            })
            .unwrap_or(1)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ResourceError {
        ResourceError::xml(
            self.file.clone(),
            format!("line {}: {}", self.line_number(), message.into()),
        )
    }
}

fn split_qname(qname: &[u8]) -> (Option<String>, String) {
    let qname = String::from_utf8_lossy(qname);
    match qname.split_once(':') {
        Some((prefix, name)) => (Some(prefix.to_string()), name.to_string()),
        None => (None, qname.into_owned()),
    }
}
