use thiserror::Error;

/// Errors raised while parsing or compiling predicates
///
/// All of these surface before any request reaches the search service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A node is missing a field its kind requires, or a field has the wrong shape
    #[error("Malformed predicate at {path}: {reason}")]
    MalformedPredicate { path: String, reason: String },

    #[error("Unsupported predicate kind '{kind}' at {path}")]
    UnsupportedKind { path: String, kind: String },

    #[error("Unsupported operator '{operator}' at {path}")]
    UnsupportedOperator { path: String, operator: String },

    #[error("Predicate nesting exceeds maximum depth of {max_depth}")]
    RecursionLimitExceeded { max_depth: usize },

    #[error("Filter input exceeds maximum size of {max_bytes} bytes")]
    InputTooLarge { max_bytes: usize },

    #[error("Invalid filter JSON: {0}")]
    InvalidJson(String),
}

impl FilterError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPredicate {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_kind(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            path: path.into(),
            kind: kind.into(),
        }
    }

    pub fn unsupported_operator(path: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            path: path.into(),
            operator: operator.into(),
        }
    }

    /// Whether lenient compilation may drop the offending node instead of failing
    pub fn is_node_local(&self) -> bool {
        matches!(
            self,
            Self::MalformedPredicate { .. }
                | Self::UnsupportedKind { .. }
                | Self::UnsupportedOperator { .. }
        )
    }
}
