//! Search request builder
//!
//! Accumulates search text, predicates, ordering, paging and raw service
//! options for one query.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::filters::{Operator, PredicateNode, Scalar};

use super::searchable::Searchable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!(
                "Invalid sort direction '{}'. Valid options: asc, desc",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub direction: SortDirection,
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

/// One search query against one index
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    pub index: String,
    /// Full-text search text; `*` matches everything
    pub query: String,
    pub wheres: Vec<PredicateNode>,
    pub orders: Vec<OrderClause>,
    pub limit: Option<usize>,
    /// Extra request body fields; built fields take precedence on conflict
    pub options: Map<String, Value>,
}

impl SearchBuilder {
    pub fn new(index: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    /// Query the index a record lives in
    pub fn for_model<M: Searchable>(model: &M, query: impl Into<String>) -> Self {
        Self::new(model.searchable_as(), query)
    }

    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.where_node(PredicateNode::eq(column, value))
    }

    pub fn where_op(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Scalar>,
    ) -> Self {
        self.where_node(PredicateNode::basic(column, operator, value))
    }

    pub fn where_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.where_node(PredicateNode::is_in(column, values))
    }

    pub fn where_not_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.where_node(PredicateNode::not_in(column, values))
    }

    pub fn where_node(mut self, node: PredicateNode) -> Self {
        self.wheres.push(node);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.orders.push(OrderClause {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// `orderby` parameter: `col dir, col dir`
    pub fn order_by_clause(&self) -> Option<String> {
        if self.orders.is_empty() {
            return None;
        }
        Some(
            self.orders
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
