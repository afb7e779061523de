use super::types::ResourceType;
use std::fmt;

/// How a resource URL refers to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// `@type/name`
    Reference,
    /// `@+id/name`
    Create,
    /// `?attr/name` or `?name`
    Attr,
    /// A bare `[prefix:]name`, as used for style items and style parents
    Name,
}

/// A parsed reference such as `@android:string/ok`, `?colorPrimary` or
/// `android:Theme.Light`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrl {
    pub kind: UrlKind,
    pub namespace: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub name: String,
    /// `@*android:...` access to private framework resources
    pub private_access: bool,
}

impl ResourceUrl {
    /// Parse `@[+][*][prefix:]type/name` or `?[*][prefix:][type/]name`
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let (kind, rest) = if let Some(rest) = url.strip_prefix("@+") {
            (UrlKind::Create, rest)
        } else if let Some(rest) = url.strip_prefix('@') {
            (UrlKind::Reference, rest)
        } else if let Some(rest) = url.strip_prefix('?') {
            (UrlKind::Attr, rest)
        } else {
            return None;
        };

        let (private_access, rest) = match rest.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        let (type_part, name) = match rest.split_once('/') {
            Some((type_part, name)) => (Some(type_part), name),
            None if kind == UrlKind::Attr => (None, rest),
            None => return None,
        };

        let (namespace, resource_type) = match type_part {
            Some(type_part) => {
                let (namespace, type_name) = split_prefix(type_part);
                (namespace, Some(ResourceType::from_class_name(type_name)?))
            }
            None => (None, Some(ResourceType::Attr)),
        };

        // `?android:attr/foo` and `?android:foo` both carry the prefix before
        // the name when the type is absent
        let (namespace, name) = match namespace {
            Some(namespace) => (Some(namespace), name),
            None => split_prefix(name),
        };

        if name.is_empty() {
            return None;
        }
        if kind == UrlKind::Attr && resource_type != Some(ResourceType::Attr) {
            return None;
        }

        Some(Self {
            kind,
            namespace: namespace.map(str::to_string),
            resource_type,
            name: name.to_string(),
            private_access,
        })
    }

    /// Parse a `[prefix:]name` attr reference as found in `<item name="...">`
    /// and `<attr name="...">`
    pub fn parse_attr_reference(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('@') || text.starts_with('?') {
            return None;
        }
        let (namespace, name) = split_prefix(text);
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            kind: UrlKind::Name,
            namespace: namespace.map(str::to_string),
            resource_type: Some(ResourceType::Attr),
            name: name.to_string(),
            private_access: false,
        })
    }

    /// Parse a style `parent` attribute: `@style/Base`, `@android:style/Theme`,
    /// `android:Theme.Light` or `Theme.Light`
    pub fn parse_style_parent_reference(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if text.starts_with('@') || text.starts_with('?') {
            let url = Self::parse(text)?;
            return match url.resource_type {
                Some(ResourceType::Style) | Some(ResourceType::Attr) => Some(url),
                _ => None,
            };
        }
        let (private_access, text) = match text.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (namespace, name) = split_prefix(text);
        let name = name.strip_prefix("style/").unwrap_or(name);
        if name.is_empty() {
            return None;
        }
        Some(Self {
            kind: UrlKind::Name,
            namespace: namespace.map(str::to_string),
            resource_type: Some(ResourceType::Style),
            name: name.to_string(),
            private_access,
        })
    }

    /// `prefix:name`, or just `name` without a prefix
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}:{}", namespace, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sigil = match self.kind {
            UrlKind::Reference => "@",
            UrlKind::Create => "@+",
            UrlKind::Attr => "?",
            UrlKind::Name => return f.write_str(&self.qualified_name()),
        };
        f.write_str(sigil)?;
        if self.private_access {
            f.write_str("*")?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, "{}:", namespace)?;
        }
        if let Some(resource_type) = self.resource_type {
            if self.kind != UrlKind::Attr {
                write!(f, "{}/", resource_type)?;
            }
        }
        f.write_str(&self.name)
    }
}

fn split_prefix(text: &str) -> (Option<&str>, &str) {
    match text.split_once(':') {
        Some((prefix, rest)) => (Some(prefix), rest),
        None => (None, text),
    }
}
