use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use azure_scout::engine::{OrderClause, SortDirection};

use super::constants::{ENV_API_KEY, ENV_API_VERSION, ENV_CONFIG, ENV_ENDPOINT, ENV_TIMEOUT_SECS};

#[derive(Parser)]
#[command(name = "azscout")]
#[command(version, about = "Azure AI Search filter compiler and index tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Search service endpoint, e.g. https://my-service.search.windows.net
    #[arg(long, short = 'e', global = true, env = ENV_ENDPOINT)]
    pub endpoint: Option<String>,

    /// Admin API key
    #[arg(long, global = true, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    /// REST API version
    #[arg(long, global = true, env = ENV_API_VERSION)]
    pub api_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub timeout: Option<u64>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum predicate group nesting depth
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Drop malformed predicates with a warning instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,
}

/// Parse an order clause from `column` or `column:direction`
fn parse_order_clause(s: &str) -> Result<OrderClause, String> {
    let (column, direction) = match s.split_once(':') {
        Some((column, direction)) => (column.trim(), direction.parse::<SortDirection>()?),
        None => (s.trim(), SortDirection::Asc),
    };
    if column.is_empty() {
        return Err(format!("Invalid order '{}'. Expected column[:asc|desc]", s));
    }
    Ok(OrderClause {
        column: column.to_string(),
        direction,
    })
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile JSON predicates into a filter expression
    Filter {
        /// Predicate JSON (array of predicates or a single predicate)
        #[arg(conflicts_with = "file")]
        json: Option<String>,

        /// Read predicate JSON from a file
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
    /// Search an index
    Search(SearchArgs),
    /// Merge-or-upload (or delete) documents from a JSON file
    Upload {
        /// Index name
        index: String,

        /// JSON file holding an array of documents
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Document key field
        #[arg(long, short = 'k')]
        key: Option<String>,

        /// Delete the documents instead of uploading them
        #[arg(long)]
        delete: bool,
    },
    /// Index management commands
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },
}

#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// Index name
    pub index: String,

    /// Full-text search text
    #[arg(long, short = 'q', default_value = "*")]
    pub query: String,

    /// Predicate JSON applied as the filter
    #[arg(long)]
    pub filter: Option<String>,

    /// Maximum number of results (page size with --page)
    #[arg(long, short = 't')]
    pub top: Option<usize>,

    /// Page number, starting at 1
    #[arg(long, short = 'p')]
    pub page: Option<usize>,

    /// Sort order as column[:asc|desc]; repeatable
    #[arg(long, short = 'o', value_parser = parse_order_clause)]
    pub order: Vec<OrderClause>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum IndexCommands {
    /// Create an index from its configured settings
    Create { name: String },
    /// Delete an index
    Delete { name: String },
    /// Delete an index and recreate it from configured settings
    Flush { name: String },
}

impl Commands {
    /// Whether the command talks to the search service
    pub fn needs_service(&self) -> bool {
        !matches!(self, Commands::Filter { .. })
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Option<u64>,
    pub config: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub lenient: bool,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    split(Cli::parse())
}

fn split(cli: Cli) -> (CliConfig, Commands) {
    let config = CliConfig {
        endpoint: cli.endpoint,
        api_key: cli.api_key,
        api_version: cli.api_version,
        timeout: cli.timeout,
        config: cli.config,
        max_depth: cli.max_depth,
        lenient: cli.lenient,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> (CliConfig, Commands) {
        split(Cli::try_parse_from(args.iter().copied()).unwrap())
    }

    #[test]
    fn test_parse_order_clause() {
        let clause = parse_order_clause("price:desc").unwrap();
        assert_eq!(clause.column, "price");
        assert_eq!(clause.direction, SortDirection::Desc);

        let clause = parse_order_clause("name").unwrap();
        assert_eq!(clause.direction, SortDirection::Asc);

        assert!(parse_order_clause("price:up").is_err());
        assert!(parse_order_clause(":desc").is_err());
    }

    #[test]
    fn test_filter_command() {
        let (config, command) = parse_from(&[
            "azscout",
            "filter",
            r#"[{"type":"null","column":"x"}]"#,
            "--lenient",
        ]);
        assert!(config.lenient);
        assert!(!command.needs_service());
        assert!(matches!(command, Commands::Filter { json: Some(_), file: None }));
    }

    #[test]
    fn test_filter_json_conflicts_with_file() {
        assert!(Cli::try_parse_from(["azscout", "filter", "[]", "--file", "f.json"]).is_err());
    }

    #[test]
    fn test_search_command() {
        let (config, command) = parse_from(&[
            "azscout",
            "search",
            "products",
            "--query",
            "aspirin",
            "--top",
            "5",
            "--order",
            "price:desc",
            "--order",
            "name",
            "--endpoint",
            "https://example.search.windows.net",
        ]);
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://example.search.windows.net")
        );
        let Commands::Search(args) = command else {
            panic!("expected search command");
        };
        assert_eq!(args.index, "products");
        assert_eq!(args.query, "aspirin");
        assert_eq!(args.top, Some(5));
        assert_eq!(args.order.len(), 2);
        assert!(args.page.is_none());
    }

    #[test]
    fn test_index_commands() {
        let (_, command) = parse_from(&["azscout", "index", "flush", "products"]);
        assert!(command.needs_service());
        assert!(matches!(
            command,
            Commands::Index {
                command: IndexCommands::Flush { ref name }
            } if name == "products"
        ));
    }

    #[test]
    fn test_upload_requires_file() {
        assert!(Cli::try_parse_from(["azscout", "upload", "products"]).is_err());
        let (_, command) =
            parse_from(&["azscout", "upload", "products", "-f", "docs.json", "--delete"]);
        assert!(matches!(command, Commands::Upload { delete: true, .. }));
    }
}
