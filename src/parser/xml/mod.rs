mod layout;
mod manifest;
mod text;
mod values;

pub use layout::{LayoutParser, ScannedIds};
pub use manifest::ManifestParser;
pub use text::{extract_text, unescape_resource_string, ExtractedText};
pub use values::{NamespaceScopes, ValueResourceXmlParser, XmlToken, TAG_EAT_COMMENT};
