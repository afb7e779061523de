use clap::Parser;
use colored::Colorize;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use resource_repository::cache::{self, read_cache_file};
use resource_repository::config::Config;
use resource_repository::loader::{load_all, LoaderOptions, RepositoryLoader};
use resource_repository::report::{self, ItemQuery, Reporter};
use resource_repository::resources::{ResourceNamespace, ResourceRepository, ResourceType};

/// resrepo - Load, query and cache Android resources
#[derive(Parser, Debug)]
#[command(name = "resrepo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Resource directories (`res`) or packaged libraries (`.aar`) to load
    #[arg(default_value = "res")]
    paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Namespace of the resources: res-auto, android or a package name
    #[arg(long)]
    namespace: Option<String>,

    /// Name of the library the resources belong to
    #[arg(long)]
    library_name: Option<String>,

    /// Only list resources of this type (string, color, style, ...)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    resource_type: Option<String>,

    /// Only list resources with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Only list public resources
    #[arg(long)]
    public_only: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the binary cache of the loaded repository to FILE
    #[arg(long, value_name = "FILE")]
    write_cache: Option<PathBuf>,

    /// Load the repository from a binary cache instead of XML
    #[arg(long, value_name = "FILE", conflicts_with = "write_cache")]
    read_cache: Option<PathBuf>,

    /// Load several resource directories in parallel
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for report::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => report::ReportFormat::Terminal,
            OutputFormat::Json => report::ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("resrepo v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try the working directory, then next to the first resource root
        let root_parent = cli
            .paths
            .first()
            .and_then(|path| path.parent())
            .filter(|parent| !parent.as_os_str().is_empty());
        let mut directories: Vec<&Path> = vec![Path::new(".")];
        directories.extend(root_parent);
        Config::from_default_locations(&directories)?
    };

    // Override with CLI arguments
    if let Some(namespace) = &cli.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(library_name) = &cli.library_name {
        config.library_name = Some(library_name.clone());
    }

    Ok(config)
}

fn build_query(cli: &Cli) -> Result<ItemQuery> {
    let resource_type = match &cli.resource_type {
        Some(name) => Some(
            ResourceType::from_xml_tag_name(name)
                .or_else(|| ResourceType::from_class_name(name))
                .ok_or_else(|| miette!("Unknown resource type: {}", name))?,
        ),
        None => None,
    };

    Ok(ItemQuery {
        resource_type,
        name: cli.name.clone(),
        public_only: cli.public_only,
    })
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    let query = build_query(cli)?;
    let options = LoaderOptions::from_config(config);

    let repositories = if let Some(cache_path) = &cli.read_cache {
        let repository = read_cache_file(cache_path, None)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read cache {}", cache_path.display()))?;
        vec![repository]
    } else {
        load_repositories(config, cli, &options)?
    };

    if !cli.quiet {
        let total: usize = repositories.iter().map(ResourceRepository::item_count).sum();
        eprintln!(
            "{}",
            format!(
                "Loaded {} resources from {} repositories in {:.2}s",
                total,
                repositories.len(),
                start_time.elapsed().as_secs_f64()
            )
            .green()
        );
    }

    if let Some(cache_path) = &cli.write_cache {
        let [repository] = repositories.as_slice() else {
            return Err(miette!("--write-cache needs exactly one resource directory"));
        };
        let fingerprint = cache::fingerprint(&RepositoryLoader::new(repository.origin(), options.clone()))
            .into_diagnostic()?;
        repository
            .write_cache(cache_path, fingerprint)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write cache {}", cache_path.display()))?;
        info!("Cache written to {}", cache_path.display());
    }

    let format = match &cli.format {
        Some(format) => format.clone().into(),
        None => report::ReportFormat::parse(&config.report.format).unwrap_or_default(),
    };
    let reporter = Reporter::new(format, cli.output.clone());
    reporter.report(&repositories, &query)
}

fn load_repositories(config: &Config, cli: &Cli, options: &LoaderOptions) -> Result<Vec<ResourceRepository>> {
    use indicatif::{ProgressBar, ProgressStyle};

    let namespace = ResourceNamespace::parse(&config.namespace);
    info!("Loading {} resource directories in namespace {}", cli.paths.len(), namespace);

    // Cached loading applies to a single repository
    if config.cache.enabled && cli.paths.len() == 1 && cli.write_cache.is_none() {
        let root = &cli.paths[0];
        let cache_path = config.cache_path_for(root);
        let loader = RepositoryLoader::new(root, options.clone());
        let (repository, from_cache) = ResourceRepository::load_cached_or_fresh(&loader, &cache_path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load {}", root.display()))?;
        if from_cache {
            info!("Used cache {}", cache_path.display());
        }
        return Ok(vec![repository]);
    }

    if cli.parallel {
        if !cli.quiet {
            eprintln!(
                "{}",
                format!("⚡ Parallel mode: loading {} resource directories...", cli.paths.len()).cyan()
            );
        }
        return load_all(&cli.paths, options)
            .into_iter()
            .zip(&cli.paths)
            .map(|(result, root)| {
                result
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to load {}", root.display()))
            })
            .collect();
    }

    let pb = if cli.quiet || cli.paths.len() < 2 {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(cli.paths.len() as u64)
    };
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => warn!("Invalid progress template: {}", e),
    }

    let mut repositories = Vec::with_capacity(cli.paths.len());
    for root in &cli.paths {
        let repository = RepositoryLoader::new(root, options.clone())
            .load()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load {}", root.display()))?;
        repositories.push(repository);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(repositories)
}
