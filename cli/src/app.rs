//! Core application

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use azure_scout::engine::{SearchBuilder, SearchEngine};
use azure_scout::filters::{FilterCompiler, parse_predicates};
use azure_scout::gateway::AzureSearchClient;

use crate::core::cli::{self, Commands, IndexCommands, SearchArgs};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, DEFAULT_DOCUMENT_KEY, DEFAULT_PAGE_SIZE, ENV_LOG};
use crate::core::document::JsonDocument;
use crate::utils::file::{read_input, read_json};

pub struct CoreApp {
    pub config: AppConfig,
    engine: Option<SearchEngine>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;
        let app = Self::init(config, command.needs_service())?;
        app.execute(command).await
    }

    fn init(config: AppConfig, needs_service: bool) -> Result<Self> {
        let engine = if needs_service {
            let client = AzureSearchClient::new(&config.gateway()?)
                .context("Failed to initialize search client")?;
            Some(SearchEngine::new(Arc::new(client), config.engine.clone()))
        } else {
            None
        };
        Ok(Self { config, engine })
    }

    fn engine(&self) -> Result<&SearchEngine> {
        self.engine
            .as_ref()
            .context("Search service is not configured")
    }

    async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Filter { json, file } => self.compile_filter(json, file),
            Commands::Search(args) => self.search(args).await,
            Commands::Upload {
                index,
                file,
                key,
                delete,
            } => {
                let key = key.as_deref().unwrap_or(DEFAULT_DOCUMENT_KEY);
                self.upload(&index, &file, key, delete).await
            }
            Commands::Index { command } => self.handle_index_command(command).await,
        }
    }

    fn compile_filter(&self, json: Option<String>, file: Option<PathBuf>) -> Result<()> {
        let input = match (json, file) {
            (Some(json), _) => json,
            (None, Some(path)) => read_input(&path)?,
            (None, None) => anyhow::bail!("Provide predicate JSON or --file"),
        };

        let filter = FilterCompiler::new(self.config.engine.compiler)
            .compile_str(&input)
            .context("Failed to compile filter")?;
        println!("{}", filter);
        Ok(())
    }

    async fn search(&self, args: SearchArgs) -> Result<()> {
        let engine = self.engine()?;

        let mut builder = SearchBuilder::new(args.index, args.query);
        if let Some(filter) = args.filter {
            let predicates = parse_predicates(&filter, self.config.engine.compiler)
                .context("Invalid --filter")?;
            builder.wheres.extend(predicates);
        }
        builder.orders = args.order;

        let results = match args.page {
            Some(page) => {
                let per_page = args.top.unwrap_or(DEFAULT_PAGE_SIZE);
                engine.paginate(&builder, per_page, page).await?
            }
            None => {
                if let Some(top) = args.top {
                    builder = builder.take(top);
                }
                engine.search(&builder).await?
            }
        };

        print_json(&results)
    }

    async fn upload(&self, index: &str, file: &Path, key: &str, delete: bool) -> Result<()> {
        let engine = self.engine()?;
        let documents = JsonDocument::from_array(index, key, read_json(file)?)
            .with_context(|| format!("Invalid documents in {}", file.display()))?;

        let response = if delete {
            engine.delete(&documents).await?
        } else {
            engine.update(&documents).await?
        };

        match response {
            Some(response) => print_json(&response),
            None => {
                println!("No documents to send.");
                Ok(())
            }
        }
    }

    async fn handle_index_command(&self, cmd: IndexCommands) -> Result<()> {
        let engine = self.engine()?;
        match cmd {
            IndexCommands::Create { name } => match engine.create_index(&name).await? {
                Some(definition) => print_json(&definition),
                None => anyhow::bail!("No index settings configured for '{}'", name),
            },
            IndexCommands::Delete { name } => {
                if engine.delete_index(&name).await? {
                    println!("Deleted index: {}", name);
                } else {
                    println!("Index not found: {}", name);
                }
                Ok(())
            }
            IndexCommands::Flush { name } => match engine.flush(&name).await? {
                Some(definition) => print_json(&definition),
                None => {
                    println!("Deleted index: {} (no settings configured to recreate it)", name);
                    Ok(())
                }
            },
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
