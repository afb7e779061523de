//! Readers for the text symbol files of a library: next to the `res`
//! directory of an exploded AAR, or at the root of a packaged one.
//!
//! R.txt:
//! ```text
//! int id button 0x7f040000
//! int string app_name 0x7f050000
//! int[] styleable MyView { 0x7f010000, 0x7f010001 }
//! int styleable MyView_color 0
//! ```
//!
//! public.txt:
//! ```text
//! string app_name
//! color black
//! ```

use crate::resources::{ResourceError, ResourceType};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// `<java type> <resource type> <name> <value>`
static SYMBOL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(int(?:\[\])?)\s+(\S+)\s+(\S+)\s+(\S.*)$").expect("valid regex"));

/// Symbols declared by an R.txt file, grouped by type in file order
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<ResourceType, IndexSet<String>>,
}

impl SymbolTable {
    /// Read an R.txt file. Any malformed line fails the whole file.
    pub fn parse(path: &Path) -> Result<Self, ResourceError> {
        let content = fs::read_to_string(path)?;
        Self::parse_content(path, &content)
    }

    pub fn parse_content(path: &Path, content: &str) -> Result<Self, ResourceError> {
        let mut table = SymbolTable::default();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fail = |message: String| ResourceError::SymbolFile {
                file: path.to_path_buf(),
                line: index + 1,
                message,
            };

            let captures = SYMBOL_LINE
                .captures(line)
                .ok_or_else(|| fail(format!("malformed symbol line \"{}\"", line)))?;
            let java_type = &captures[1];
            let type_name = &captures[2];
            let name = &captures[3];
            let value = captures[4].trim();

            let resource_type = ResourceType::from_class_name(type_name)
                .ok_or_else(|| fail(format!("unknown resource type \"{}\"", type_name)))?;

            if java_type == "int[]" {
                if resource_type != ResourceType::Styleable {
                    return Err(fail(format!("int[] is only valid for styleables, not {}", type_name)));
                }
                if !(value.starts_with('{') && value.ends_with('}')) {
                    return Err(fail(format!("malformed array value \"{}\"", value)));
                }
            } else if !is_int_literal(value) {
                return Err(fail(format!("malformed value \"{}\"", value)));
            }

            table
                .symbols
                .entry(resource_type)
                .or_default()
                .insert(name.to_string());
        }

        Ok(table)
    }

    /// Names of one type, in file order
    pub fn names(&self, resource_type: ResourceType) -> impl Iterator<Item = &str> {
        self.symbols
            .get(&resource_type)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn ids(&self) -> Vec<String> {
        self.names(ResourceType::Id).map(str::to_string).collect()
    }

    pub fn contains(&self, resource_type: ResourceType, name: &str) -> bool {
        self.symbols
            .get(&resource_type)
            .is_some_and(|names| names.contains(name))
    }

    pub fn len(&self) -> usize {
        self.symbols.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_int_literal(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else {
        let digits = value.strip_prefix('-').unwrap_or(value);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    }
}

/// Resources a library exposes, read from public.txt
#[derive(Debug, Clone, Default)]
pub struct PublicResources {
    names: HashSet<(ResourceType, String)>,
}

impl PublicResources {
    pub fn parse(path: &Path) -> Result<Self, ResourceError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_content(&content))
    }

    /// Lines are `<type> <name>`; lines with an unknown type or without a
    /// name are ignored
    pub fn parse_content(content: &str) -> Self {
        let mut public = PublicResources::default();

        for line in content.lines() {
            let line = line.trim();
            let Some((type_name, name)) = line.split_once(' ') else {
                continue;
            };
            let name = name.trim();
            if type_name.is_empty() || name.is_empty() {
                continue;
            }
            if let Some(resource_type) = ResourceType::from_xml_tag_name(type_name) {
                public.names.insert((resource_type, name.to_string()));
            }
        }

        public
    }

    pub fn contains(&self, resource_type: ResourceType, name: &str) -> bool {
        self.names.contains(&(resource_type, name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
