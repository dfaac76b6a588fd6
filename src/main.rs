use expboard::cli::{Cli, Commands, ConfigAction};
use expboard::config::Config;
use expboard::error::{ExpboardError, Result};
use expboard::model::{Candidate, Radius, SearchRequest};
use expboard::search::{FacetValue, Filters, SearchResults, SearchService};
use expboard::storage::CandidateStore;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            location,
            radius,
            url,
            filters,
            page,
            page_size,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            let request = match url {
                Some(url) => SearchRequest::from_query_string(&url)?,
                None => {
                    let radius = radius.unwrap_or(config.search.default_radius_km);
                    SearchRequest::new(query).with_location(location, Radius::from_signed(radius)?)
                }
            };
            let filters = parse_filters(&filters)?;
            let page_size = page_size.unwrap_or(config.search.default_page_size);
            cmd_search(&config, &request, &filters, page, page_size, json)?;
        }
        Commands::Import { file } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_import(&config, &file)?;
        }
        Commands::List { json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_list(&config, json)?;
        }
        Commands::Geocode { locations } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_geocode(&config, &locations)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "expboard=debug" } else { "expboard=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ExpboardError::Io {
            source: e,
            context: "Failed to create tokio runtime".to_string(),
        })
}

fn parse_filters(pairs: &[String]) -> Result<Filters> {
    let mut filters = Filters::new();
    for pair in pairs {
        filters.set(FacetValue::parse(pair)?, true);
    }
    Ok(filters)
}

fn open_store(config: &Config) -> Result<CandidateStore> {
    let data_dir = expand_path(&config.storage.data_dir)?;
    CandidateStore::open(&data_dir.join(&config.storage.database_file))
}

fn cmd_search(
    config: &Config,
    request: &SearchRequest,
    filters: &Filters,
    page: usize,
    page_size: usize,
    json: bool,
) -> Result<()> {
    let store = open_store(config)?;
    let candidates = store.list_all()?;
    let service = SearchService::from_config(config)?;

    let rt = runtime()?;
    let Some(results) = rt.block_on(service.search(&candidates, request, filters)) else {
        // only one search is ever issued from the CLI
        return Ok(());
    };

    if json {
        print_json(&search_json(&results, page_size, page))?;
    } else {
        print_results(&results, page_size, page);
    }

    Ok(())
}

fn search_json(results: &SearchResults<'_>, page_size: usize, page: usize) -> serde_json::Value {
    let current = results.page(page_size, page);
    serde_json::json!({
        "query": results.request.to_query_string(),
        "page": current.page,
        "pageSize": current.page_size,
        "totalPages": current.total_pages,
        "totalItems": current.total_items,
        "results": current.items,
        "diagnostics": results.diagnostics,
    })
}

fn print_results(results: &SearchResults<'_>, page_size: usize, page: usize) {
    for notice in results.diagnostics.notices() {
        println!("⚠ {}", notice);
    }

    let current = results.page(page_size, page);
    if current.items.is_empty() {
        println!("No results");
        return;
    }

    for candidate in current.items {
        print_candidate(candidate);
    }

    println!(
        "\nPage {} of {} ({} results)",
        current.page, current.total_pages, current.total_items
    );
}

fn print_candidate(candidate: &Candidate) {
    println!(
        "[{}] {} at {} | {} ({}) | {} | {} | {}",
        candidate.id,
        candidate.title,
        candidate.company_name,
        candidate.location,
        candidate.location_type,
        candidate.industry,
        candidate.skill_level,
        candidate.duration_label
    );
    if !candidate.skills.is_empty() {
        println!("    skills: {}", candidate.skills.join(", "));
    }
}

fn cmd_import(config: &Config, file: &Path) -> Result<()> {
    let store = open_store(config)?;
    let count = store.import_json(file)?;
    println!("✓ Imported {} postings ({} total)", count, store.count()?);
    Ok(())
}

fn cmd_list(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let candidates = store.list_all()?;

    if json {
        print_json(&candidates)?;
    } else if candidates.is_empty() {
        println!("No postings stored. Run 'expboard import <file>' first.");
    } else {
        for candidate in &candidates {
            print_candidate(candidate);
        }
    }
    Ok(())
}

fn cmd_geocode(config: &Config, locations: &[String]) -> Result<()> {
    let service = SearchService::from_config(config)?;
    let Some(resolver) = service.resolver() else {
        return Ok(());
    };

    let rt = runtime()?;
    let resolved = rt.block_on(resolver.resolve_batch(locations));

    for location in locations {
        match resolved.get(location).and_then(Option::as_ref) {
            Some(place) => println!(
                "{} -> {:.4}, {:.4} ({})",
                location, place.coordinates.lat, place.coordinates.lng, place.display_name
            ),
            None => println!("{} -> unresolved", location),
        }
    }

    let stats = resolver.cache_stats();
    tracing::debug!(
        "Geocode cache: {} entries, {:.0}% hit rate",
        stats.entries,
        stats.hit_rate() * 100.0
    );
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, None)?;
            print_json(&config)?;
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ExpboardError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'expboard config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        return Ok(config);
    }

    match profile {
        Some(profile) => Config::load_with_profile(&path, &profile),
        None => Config::load(&path),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ExpboardError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ExpboardError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ExpboardError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
