//! # Azure Scout
//!
//! Full-text search on Azure AI Search for application records.
//!
//! - [`filters`] compiles query predicates into OData filter expressions.
//! - [`gateway`] is the REST transport to the search service.
//! - [`engine`] keeps indexes in sync with records and runs searches.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use azure_scout::{AzureSearchClient, EngineConfig, GatewayConfig, SearchBuilder, SearchEngine};
//! use azure_scout::filters::Operator;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureSearchClient::new(&GatewayConfig::new(
//!     "https://my-service.search.windows.net",
//!     "admin-key",
//! ))?;
//! let engine = SearchEngine::new(Arc::new(client), EngineConfig::default());
//!
//! let builder = SearchBuilder::new("products", "aspirin")
//!     .where_eq("category", "Medicine")
//!     .where_op("sales_price", Operator::Lt, 100)
//!     .take(10);
//! let results = engine.search(&builder).await?;
//! println!("{} matches", azure_scout::engine::total_count(&results));
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod filters;
pub mod gateway;

pub use engine::{EngineConfig, EngineError, SearchBuilder, SearchEngine, Searchable};
pub use filters::{FilterCompiler, FilterError, PredicateNode};
pub use gateway::{AzureSearchClient, GatewayConfig, GatewayError, SearchGateway};
