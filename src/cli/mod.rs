//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "expboard",
    version,
    about = "Search unpaid experience opportunities on ExpBoard",
    long_about = "ExpBoard connects learners looking for experience with companies offering it. \
                  This tool searches the local posting store with text, semantic and radius \
                  matching, facet filters and pagination."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/expboard/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search postings
    Search {
        /// Free-text query matched against title, company and skills
        #[arg(default_value = "")]
        query: String,

        /// Location to search around, or "Remote"
        #[arg(short, long, default_value = "")]
        location: String,

        /// Radius in km around the location; -1 means any distance
        #[arg(short, long, allow_hyphen_values = true)]
        radius: Option<i64>,

        /// Deep-link query string (q=..&location=..&radius=..); overrides the above
        #[arg(long, value_name = "QUERY_STRING", conflicts_with_all = ["location", "radius"])]
        url: Option<String>,

        /// Facet filter as facet=value (industry, skill, type, duration); repeatable
        #[arg(short, long = "filter", value_name = "FACET=VALUE")]
        filters: Vec<String>,

        /// Page number (1-indexed)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Results per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Import postings from a JSON file
    Import {
        /// JSON array of postings
        file: PathBuf,
    },

    /// List every stored posting
    List {
        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve place names to coordinates
    Geocode {
        /// Place names to resolve
        #[arg(required = true)]
        locations: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from([
            "expboard",
            "search",
            "react",
            "--location",
            "Austin, TX",
            "--radius",
            "-1",
            "-f",
            "industry=tech",
            "-f",
            "skill=beginner",
        ])
        .unwrap();

        match cli.command {
            Commands::Search {
                query,
                radius,
                filters,
                ..
            } => {
                assert_eq!(query, "react");
                assert_eq!(radius, Some(-1));
                assert_eq!(filters.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
