use super::{ItemQuery, RepositorySummary};
use crate::resources::{ItemKind, ResourceItem, ResourceRepository};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, repositories: &[ResourceRepository], query: &ItemQuery) -> Result<()> {
        let json = Self::render(repositories, query)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(repositories: &[ResourceRepository], query: &ItemQuery) -> Result<String> {
        let report = JsonReport {
            version: "1.0",
            repositories: repositories
                .iter()
                .map(|repository| JsonRepository::new(repository, query))
                .collect(),
        };
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    repositories: Vec<JsonRepository>,
}

#[derive(Serialize)]
struct JsonRepository {
    origin: String,
    namespace: String,
    library_name: Option<String>,
    package_name: Option<String>,
    configurations: usize,
    total_items: usize,
    public_items: usize,
    types: BTreeMap<&'static str, JsonTypeCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<JsonItem>>,
}

#[derive(Serialize)]
struct JsonTypeCount {
    items: usize,
    public: usize,
}

#[derive(Serialize)]
struct JsonItem {
    key: String,
    #[serde(rename = "type")]
    resource_type: &'static str,
    name: String,
    visibility: &'static str,
    url: String,
    value: Option<String>,
    source: Option<String>,
}

impl JsonRepository {
    fn new(repository: &ResourceRepository, query: &ItemQuery) -> Self {
        let summary = RepositorySummary::from_repository(repository);
        let items = query.is_listing().then(|| {
            query
                .select(repository)
                .into_iter()
                .map(|item| JsonItem::new(repository, item))
                .collect()
        });

        Self {
            origin: summary.origin.to_string_lossy().to_string(),
            public_items: summary.total_public(),
            namespace: summary.namespace,
            library_name: summary.library_name,
            package_name: summary.package_name,
            configurations: summary.configurations,
            total_items: summary.total_items,
            types: summary
                .by_type
                .iter()
                .map(|(resource_type, count)| {
                    (
                        resource_type.name(),
                        JsonTypeCount {
                            items: count.items,
                            public: count.public,
                        },
                    )
                })
                .collect(),
            items,
        }
    }
}

impl JsonItem {
    fn new(repository: &ResourceRepository, item: &ResourceItem) -> Self {
        let value = match item.kind() {
            ItemKind::Style { parent, .. } => parent.clone(),
            _ => item.resource_value().map(str::to_string),
        };
        Self {
            key: repository.key(item),
            resource_type: item.resource_type().name(),
            name: item.name().to_string(),
            visibility: item.visibility().as_str(),
            url: repository.resource_url(item).to_string(),
            value,
            source: repository
                .source_path(item)
                .map(|path| path.to_string_lossy().to_string()),
        }
    }
}
