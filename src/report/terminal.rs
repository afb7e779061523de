use super::{ItemQuery, RepositorySummary};
use crate::resources::{ItemKind, ResourceItem, ResourceRepository, ResourceVisibility};
use colored::Colorize;
use miette::Result;

/// Longest value shown before it is cut off
const MAX_VALUE_WIDTH: usize = 60;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    show_sources: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_sources: true }
    }

    pub fn with_sources(mut self, show: bool) -> Self {
        self.show_sources = show;
        self
    }

    pub fn report(&self, repositories: &[ResourceRepository], query: &ItemQuery) -> Result<()> {
        if repositories.is_empty() {
            println!("{}", "No resource repositories loaded".yellow().bold());
            return Ok(());
        }

        for repository in repositories {
            let summary = RepositorySummary::from_repository(repository);
            self.print_header(&summary);
            if query.is_listing() {
                self.print_items(repository, query);
            } else {
                self.print_summary(&summary);
            }
            println!();
        }

        Ok(())
    }

    fn print_header(&self, summary: &RepositorySummary) {
        println!();
        println!("{}", summary.origin.display().to_string().cyan().bold());

        let mut details = vec![format!("namespace {}", summary.namespace)];
        if let Some(library) = &summary.library_name {
            details.push(format!("library {}", library));
        }
        if let Some(package) = &summary.package_name {
            details.push(format!("package {}", package));
        }
        println!("  {}", details.join(", ").dimmed());
    }

    fn print_summary(&self, summary: &RepositorySummary) {
        if summary.by_type.is_empty() {
            println!("  {}", "No resources found".yellow());
            return;
        }

        for (resource_type, count) in &summary.by_type {
            println!(
                "  {:<14} {:>6} {}",
                resource_type.display_name(),
                count.items,
                format!("({} public)", count.public).dimmed()
            );
        }

        println!("  {}", "─".repeat(40).dimmed());
        println!(
            "  {} in {} configurations, {}",
            format!("{} resources", summary.total_items).green().bold(),
            summary.configurations,
            format!("{} public", summary.total_public()).green()
        );
    }

    fn print_items(&self, repository: &ResourceRepository, query: &ItemQuery) {
        let items = query.select(repository);
        if items.is_empty() {
            println!("  {}", "No matching resources".yellow());
            return;
        }

        for item in &items {
            self.print_item(repository, item);
        }
        println!("  {}", format!("{} matching variants", items.len()).dimmed());
    }

    fn print_item(&self, repository: &ResourceRepository, item: &ResourceItem) {
        let visibility = match item.visibility() {
            ResourceVisibility::Public => "public".green(),
            ResourceVisibility::Private => "private".yellow(),
            ResourceVisibility::PrivateXmlOnly => "private-xml".red(),
        };

        println!(
            "  {} [{}] {}",
            repository.key(item).white().bold(),
            visibility,
            describe(item)
        );

        if self.show_sources {
            if let Some(path) = repository.source_path(item) {
                println!("    {} {}", "→".dimmed(), path.display().to_string().dimmed());
            }
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line description of an item's value
fn describe(item: &ResourceItem) -> String {
    match item.kind() {
        ItemKind::Value { text, .. } => text.as_deref().map(truncate).unwrap_or_default(),
        ItemKind::Array { elements, .. } => format!("[{} elements]", elements.len()),
        ItemKind::Plurals { quantities, .. } => {
            let arities: Vec<&str> = quantities.iter().map(|(arity, _)| arity.name()).collect();
            format!("{{{}}}", arities.join(", "))
        }
        ItemKind::Attr(definition) => {
            if definition.values.is_empty() {
                format!("{:?}", definition.formats)
            } else {
                format!("{:?} ({} values)", definition.formats, definition.values.len())
            }
        }
        ItemKind::AttrReference(reference) => format!("→ {}", reference.namespace),
        ItemKind::Style { parent, items } => match parent {
            Some(parent) => format!("parent {}, {} items", parent, items.len()),
            None => format!("{} items", items.len()),
        },
        ItemKind::Styleable { attrs } => format!("{} attrs", attrs.len()),
        ItemKind::File { relative_path, .. } => relative_path.clone(),
    }
}

fn truncate(text: &str) -> String {
    let single_line = text.replace('\n', "\\n");
    if single_line.chars().count() <= MAX_VALUE_WIDTH {
        single_line
    } else {
        let cut: String = single_line.chars().take(MAX_VALUE_WIDTH - 1).collect();
        format!("{}…", cut)
    }
}
