//! Predicate type definitions
//!
//! Typed predicate tree consumed by the filter compiler. Every node variant
//! carries exactly the fields its fragment needs, so a compiled node can never
//! be missing a column or an operator.

use std::fmt;
use std::str::FromStr;

use serde_json::Number;

/// A single predicate condition
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// Comparison such as `age > 18`
    Basic {
        column: String,
        operator: Operator,
        value: Scalar,
    },
    /// Pattern match through `search.ismatch`
    Pattern {
        column: String,
        kind: PatternKind,
        value: Scalar,
    },
    Null {
        column: String,
    },
    NotNull {
        column: String,
    },
    /// Set membership through `search.in`
    In {
        column: String,
        values: Vec<Scalar>,
    },
    NotIn {
        column: String,
        values: Vec<Scalar>,
    },
    Boolean {
        column: String,
        value: bool,
    },
    /// Caller-authored filter text, operator symbols are normalized
    Raw {
        expression: String,
    },
    /// Parenthesized sub-tree joined by its own connective
    Group {
        connective: Connective,
        negated: bool,
        conditions: Vec<PredicateNode>,
    },
    /// Positional shorthand entry, emitted verbatim
    Fragment(String),
}

impl PredicateNode {
    /// Shorthand `column = value` predicate
    pub fn eq(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Basic {
            column: column.into(),
            operator: Operator::Eq,
            value: value.into(),
        }
    }

    pub fn basic(column: impl Into<String>, operator: Operator, value: impl Into<Scalar>) -> Self {
        Self::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn pattern(column: impl Into<String>, kind: PatternKind, value: impl Into<String>) -> Self {
        Self::Pattern {
            column: column.into(),
            kind,
            value: Scalar::String(value.into()),
        }
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::NotIn {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn group(connective: Connective, conditions: Vec<PredicateNode>) -> Self {
        Self::Group {
            connective,
            negated: false,
            conditions,
        }
    }

    /// Variant name, used in log fields
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "Basic",
            Self::Pattern { kind, .. } => kind.as_str(),
            Self::Null { .. } => "Null",
            Self::NotNull { .. } => "NotNull",
            Self::In { .. } => "In",
            Self::NotIn { .. } => "NotIn",
            Self::Boolean { .. } => "Boolean",
            Self::Raw { .. } => "Raw",
            Self::Group { .. } => "Group",
            Self::Fragment(_) => "Fragment",
        }
    }
}

/// Scalar operand of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Printed exactly as given (`18` stays `18`, `0.5` stays `0.5`)
    Number(Number),
    String(String),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value).into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// Non-finite floats have no literal in the filter grammar and become `Null`
impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Comparison and pattern operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    StartsWith,
    EndsWith,
    Contains,
}

impl Operator {
    /// Grammar token for comparison operators; `None` for pattern operators
    pub fn token(&self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("eq"),
            Self::Ne => Some("ne"),
            Self::Gt => Some("gt"),
            Self::Ge => Some("ge"),
            Self::Lt => Some("lt"),
            Self::Le => Some("le"),
            Self::Like | Self::StartsWith | Self::EndsWith | Self::Contains => None,
        }
    }

    /// Pattern kind for pattern operators; `None` for comparisons
    pub fn pattern_kind(&self) -> Option<PatternKind> {
        match self {
            Self::Like => Some(PatternKind::Like),
            Self::StartsWith => Some(PatternKind::StartsWith),
            Self::EndsWith => Some(PatternKind::EndsWith),
            Self::Contains => Some(PatternKind::Contains),
            _ => None,
        }
    }

    /// Symbolic aliases recognized inside raw fragments, longest first
    pub(crate) const RAW_ALIASES: [(&'static str, Operator); 8] = [
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("<>", Operator::Ne),
        ("!=", Operator::Ne),
        ("==", Operator::Eq),
        ("=", Operator::Eq),
        ("<", Operator::Lt),
        (">", Operator::Gt),
    ];
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(Self::Eq),
            "!=" | "<>" | "ne" => Ok(Self::Ne),
            ">" | "gt" => Ok(Self::Gt),
            ">=" | "ge" => Ok(Self::Ge),
            "<" | "lt" => Ok(Self::Lt),
            "<=" | "le" => Ok(Self::Le),
            "like" => Ok(Self::Like),
            "startswith" | "starts" | "starts_with" => Ok(Self::StartsWith),
            "endswith" | "ends" | "ends_with" => Ok(Self::EndsWith),
            "contains" => Ok(Self::Contains),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.token(), self.pattern_kind()) {
            (Some(token), _) => write!(f, "{}", token),
            (None, Some(kind)) => write!(f, "{}", kind.as_str().to_lowercase()),
            (None, None) => Ok(()),
        }
    }
}

/// How a pattern value is wildcarded before matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Like,
    StartsWith,
    EndsWith,
    Contains,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "Like",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::Contains => "Contains",
        }
    }

    /// Apply the wildcard marker for this kind
    pub fn wildcard(&self, value: &str) -> String {
        match self {
            Self::StartsWith => format!("{}*", value),
            Self::EndsWith => format!("*{}", value),
            Self::Like | Self::Contains => value.to_string(),
        }
    }
}

/// Logical joiner applied between siblings of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl FromStr for Connective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" | "&&" => Ok(Self::And),
            "or" | "||" => Ok(Self::Or),
            other => Err(format!("unknown connective '{}'", other)),
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
