//! JSON documents read from upload files

use anyhow::{Result, bail};
use serde_json::{Map, Value};

use azure_scout::Searchable;

/// A document taken verbatim from a JSON file
#[derive(Debug, Clone)]
pub struct JsonDocument {
    index: String,
    key_name: String,
    key: Value,
    fields: Map<String, Value>,
}

impl JsonDocument {
    /// Build documents from a JSON array of objects; every object must carry
    /// a non-null `key_name` field
    pub fn from_array(index: &str, key_name: &str, value: Value) -> Result<Vec<Self>> {
        let Value::Array(items) = value else {
            bail!("Expected a JSON array of documents");
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let Value::Object(fields) = item else {
                    bail!("Document {} is not a JSON object", i);
                };
                let key = match fields.get(key_name) {
                    Some(Value::Null) | None => {
                        bail!("Document {} has no '{}' key field", i, key_name)
                    }
                    Some(key) => key.clone(),
                };
                Ok(Self {
                    index: index.to_string(),
                    key_name: key_name.to_string(),
                    key,
                    fields,
                })
            })
            .collect()
    }
}

impl Searchable for JsonDocument {
    fn searchable_as(&self) -> String {
        self.index.clone()
    }

    fn key_name(&self) -> &str {
        &self.key_name
    }

    fn key(&self) -> Value {
        self.key.clone()
    }

    fn to_searchable_document(&self) -> Map<String, Value> {
        self.fields.clone()
    }
}
