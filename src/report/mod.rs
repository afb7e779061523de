mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::resources::{ResourceItem, ResourceRepository, ResourceType, ResourceVisibility};
use miette::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl ReportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "terminal" | "text" => Some(ReportFormat::Terminal),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Filter applied to the items of a repository
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub resource_type: Option<ResourceType>,
    pub name: Option<String>,
    pub public_only: bool,
}

impl ItemQuery {
    /// Whether the query selects items instead of asking for a summary
    pub fn is_listing(&self) -> bool {
        self.resource_type.is_some() || self.name.is_some()
    }

    pub fn matches(&self, item: &ResourceItem) -> bool {
        self.resource_type.map_or(true, |t| item.resource_type() == t)
            && self.name.as_deref().map_or(true, |name| item.name() == name)
            && (!self.public_only || item.visibility() == ResourceVisibility::Public)
    }

    /// Matching items, every configuration variant included
    pub fn select<'a>(&self, repository: &'a ResourceRepository) -> Vec<&'a ResourceItem> {
        let namespace = repository.namespace();
        let types: Vec<ResourceType> = match self.resource_type {
            Some(resource_type) => vec![resource_type],
            None => repository.types().collect(),
        };

        let mut selected = Vec::new();
        for resource_type in types {
            if self.public_only {
                selected.extend(
                    repository
                        .public_resources(namespace, resource_type)
                        .into_iter()
                        .filter(|item| self.matches(item)),
                );
            } else {
                match &self.name {
                    Some(name) => selected.extend(repository.get_resources_named(namespace, resource_type, name)),
                    None => selected.extend(repository.get_resources(namespace, resource_type).values().flatten()),
                }
            }
        }
        selected
    }
}

/// Item and public counts of one type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCount {
    pub items: usize,
    pub public: usize,
}

/// Counts shown for a loaded repository
#[derive(Debug, Clone)]
pub struct RepositorySummary {
    pub origin: PathBuf,
    pub namespace: String,
    pub library_name: Option<String>,
    pub package_name: Option<String>,
    pub configurations: usize,
    pub total_items: usize,
    pub by_type: BTreeMap<ResourceType, TypeCount>,
}

impl RepositorySummary {
    pub fn from_repository(repository: &ResourceRepository) -> Self {
        let namespace = repository.namespace();
        let by_type = repository
            .types()
            .map(|resource_type| {
                let items = repository
                    .get_resources(namespace, resource_type)
                    .values()
                    .map(Vec::len)
                    .sum();
                let public = repository.public_resources(namespace, resource_type).len();
                (resource_type, TypeCount { items, public })
            })
            .collect();

        Self {
            origin: repository.origin().to_path_buf(),
            namespace: namespace.to_string(),
            library_name: repository.library_name().map(str::to_string),
            package_name: repository.package_name().map(str::to_string),
            configurations: repository.configurations().len(),
            total_items: repository.item_count(),
            by_type,
        }
    }

    pub fn total_public(&self) -> usize {
        self.by_type.values().map(|count| count.public).sum()
    }
}

/// Reporter for loaded repositories
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    /// Print a summary of each repository, or the items selected by a
    /// listing query
    pub fn report(&self, repositories: &[ResourceRepository], query: &ItemQuery) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new();
                reporter.report(repositories, query)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(repositories, query)
            }
        }
    }
}
