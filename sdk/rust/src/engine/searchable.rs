//! Record-to-document mapping

use serde_json::{Map, Value};

/// Default document key field
pub const DEFAULT_KEY_NAME: &str = "id";

/// A record that can be mirrored into a search index
pub trait Searchable {
    /// Name of the index holding this record's documents
    fn searchable_as(&self) -> String;

    /// Document field holding the record key
    fn key_name(&self) -> &str {
        DEFAULT_KEY_NAME
    }

    /// Record key, written to [`Searchable::key_name`] on every document
    fn key(&self) -> Value;

    /// Searchable fields of the record; an empty map means "do not index"
    fn to_searchable_document(&self) -> Map<String, Value>;
}
