use std::fmt;

pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";
pub const AUTO_URI: &str = "http://schemas.android.com/apk/res-auto";
pub const TOOLS_URI: &str = "http://schemas.android.com/tools";
pub const XLIFF_URI: &str = "urn:oasis:names:tc:xliff:document:1.2";
/// Prefix of package-specific namespace URIs
pub const URI_PREFIX: &str = "http://schemas.android.com/apk/res/";

pub const ANDROID_PACKAGE: &str = "android";

/// Identity of the namespace a resource lives in.
///
/// Resources from different namespaces are never comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceNamespace {
    /// The framework namespace
    Android,
    /// The app-local namespace of a non-namespaced build
    ResAuto,
    /// `tools:` attributes, never holds resources
    Tools,
    /// A namespaced library or application package
    Package(String),
}

impl ResourceNamespace {
    pub fn from_package_name(package: &str) -> Self {
        if package == ANDROID_PACKAGE {
            ResourceNamespace::Android
        } else {
            ResourceNamespace::Package(package.to_string())
        }
    }

    /// Namespace for a URI, `None` when the URI is not a resource namespace
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            ANDROID_URI => Some(ResourceNamespace::Android),
            AUTO_URI => Some(ResourceNamespace::ResAuto),
            TOOLS_URI => Some(ResourceNamespace::Tools),
            _ => uri
                .strip_prefix(URI_PREFIX)
                .filter(|package| !package.is_empty())
                .map(Self::from_package_name),
        }
    }

    /// Parse the textual form used in configuration files
    pub fn parse(text: &str) -> Self {
        match text {
            "res-auto" | "" => ResourceNamespace::ResAuto,
            "tools" => ResourceNamespace::Tools,
            other => Self::from_package_name(other),
        }
    }

    pub fn uri(&self) -> String {
        match self {
            ResourceNamespace::Android => ANDROID_URI.to_string(),
            ResourceNamespace::ResAuto => AUTO_URI.to_string(),
            ResourceNamespace::Tools => TOOLS_URI.to_string(),
            ResourceNamespace::Package(package) => format!("{}{}", URI_PREFIX, package),
        }
    }

    pub fn package_name(&self) -> Option<&str> {
        match self {
            ResourceNamespace::Android => Some(ANDROID_PACKAGE),
            ResourceNamespace::Package(package) => Some(package),
            ResourceNamespace::ResAuto | ResourceNamespace::Tools => None,
        }
    }

    /// Resolve a prefix (`android`, `app`, a package name, or none) the way
    /// resource references are resolved inside value files.
    ///
    /// Returns `None` when the prefix is bound to a URI that is not a
    /// resource namespace.
    pub fn from_prefix(
        prefix: Option<&str>,
        default: &ResourceNamespace,
        resolver: &NamespaceResolver,
    ) -> Option<Self> {
        let prefix = match prefix {
            None | Some("") => return Some(default.clone()),
            Some(prefix) => prefix,
        };

        match resolver.prefix_to_uri(prefix) {
            Some(uri) => Self::from_uri(uri),
            None if prefix == ANDROID_PACKAGE => Some(ResourceNamespace::Android),
            None => Some(Self::from_package_name(prefix)),
        }
    }
}

impl fmt::Display for ResourceNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceNamespace::Android => f.write_str(ANDROID_PACKAGE),
            ResourceNamespace::ResAuto => f.write_str("res-auto"),
            ResourceNamespace::Tools => f.write_str("tools"),
            ResourceNamespace::Package(package) => f.write_str(package),
        }
    }
}

/// Prefix to URI bindings visible at one point of an XML document.
///
/// Bindings are ordered innermost first, so a prefix redeclared by an inner
/// element shadows the outer one. Instances are immutable and shared behind
/// `Arc` once interned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamespaceResolver {
    bindings: Vec<(String, String)>,
}

impl NamespaceResolver {
    pub const EMPTY: NamespaceResolver = NamespaceResolver { bindings: Vec::new() };

    pub fn new(bindings: Vec<(String, String)>) -> Self {
        Self { bindings }
    }

    pub fn namespace_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn prefix_to_uri(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn uri_to_prefix(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}
