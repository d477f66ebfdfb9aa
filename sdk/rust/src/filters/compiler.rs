//! Filter expression compiler
//!
//! Translates a predicate tree into a single OData filter expression.
//! Top-level nodes are joined with ` and `; nodes that compile to nothing are
//! left out of the join.

use serde_json::Value;

use super::error::FilterError;
use super::literal::{enclose_disjunction, escape_literal, normalize_raw};
use super::parser::{PredicateParser, parse_predicates};
use super::types::{Connective, Operator, PatternKind, PredicateNode, Scalar};

/// Default maximum group nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Function token used for pattern matches
const MATCH_FUNCTION: &str = "search.ismatch";

/// Function token used for set membership
const MEMBERSHIP_FUNCTION: &str = "search.in";

/// Delimiter passed to `search.in`; members are joined with the same character
const MEMBERSHIP_DELIMITER: char = ',';

/// Compiler behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Maximum group nesting depth before compilation fails
    pub max_depth: usize,
    /// Fail on malformed or unsupported nodes instead of dropping them
    pub strict: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: true,
        }
    }
}

impl CompilerOptions {
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }
}

/// Compiles predicate trees into filter expressions
///
/// Holds no state besides its options, so one instance can be shared across
/// threads freely.
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    options: CompilerOptions,
}

impl FilterCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Compile a typed predicate tree
    ///
    /// Returns an empty string when no node produces a fragment; callers must
    /// then omit the filter parameter entirely.
    pub fn compile(&self, tree: &[PredicateNode]) -> Result<String, FilterError> {
        let mut fragments = Vec::with_capacity(tree.len());
        for (i, node) in tree.iter().enumerate() {
            let path = format!("wheres[{}]", i);
            let fragment = self.compile_guarded(node, &path, 1)?;
            if !fragment.trim().is_empty() {
                fragments.push(fragment);
            }
        }

        let filter = fragments.join(" and ");
        tracing::trace!(nodes = tree.len(), filter = %filter, "Compiled filter");
        Ok(filter)
    }

    /// Parse loosely-typed JSON predicates and compile them
    pub fn compile_value(&self, input: &Value) -> Result<String, FilterError> {
        let tree = PredicateParser::new(self.options).parse_value(input)?;
        self.compile(&tree)
    }

    /// Parse a JSON document of predicates and compile it
    pub fn compile_str(&self, json_str: &str) -> Result<String, FilterError> {
        let tree = parse_predicates(json_str, self.options)?;
        self.compile(&tree)
    }

    /// Compile one node, dropping it in lenient mode when it is malformed
    fn compile_guarded(
        &self,
        node: &PredicateNode,
        path: &str,
        depth: usize,
    ) -> Result<String, FilterError> {
        match self.compile_node(node, path, depth) {
            Ok(fragment) => Ok(fragment),
            Err(e) if !self.options.strict && e.is_node_local() => {
                tracing::warn!(path = %path, kind = node.kind_name(), error = %e, "Dropping predicate");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    fn compile_node(
        &self,
        node: &PredicateNode,
        path: &str,
        depth: usize,
    ) -> Result<String, FilterError> {
        if depth > self.options.max_depth {
            return Err(FilterError::RecursionLimitExceeded {
                max_depth: self.options.max_depth,
            });
        }

        let fragment = match node {
            PredicateNode::Basic {
                column,
                operator,
                value,
            } => format_comparison(column, *operator, value),
            PredicateNode::Pattern {
                column,
                kind,
                value,
            } => match value {
                Scalar::Null => format!("{} eq null", column),
                _ => format_pattern(column, *kind, value),
            },
            PredicateNode::Null { column } => format!("{} eq null", column),
            PredicateNode::NotNull { column } => format!("{} ne null", column),
            PredicateNode::In { column, values } => format_membership(column, values, path)?,
            PredicateNode::NotIn { column, values } => {
                format!("not {}", format_membership(column, values, path)?)
            }
            PredicateNode::Boolean { column, value } => format!("{} eq {}", column, value),
            PredicateNode::Raw { expression } => enclose_disjunction(normalize_raw(expression)),
            PredicateNode::Group {
                connective,
                negated,
                conditions,
            } => self.compile_group(*connective, *negated, conditions, path, depth)?,
            PredicateNode::Fragment(text) => enclose_disjunction(text.clone()),
        };

        Ok(fragment)
    }

    fn compile_group(
        &self,
        connective: Connective,
        negated: bool,
        conditions: &[PredicateNode],
        path: &str,
        depth: usize,
    ) -> Result<String, FilterError> {
        let mut parts = Vec::with_capacity(conditions.len());
        for (i, child) in conditions.iter().enumerate() {
            let child_path = format!("{}.conditions[{}]", path, i);
            let fragment = self.compile_guarded(child, &child_path, depth + 1)?;
            if !fragment.trim().is_empty() {
                parts.push(fragment);
            }
        }

        // "()" is not a valid expression; an empty group constrains nothing
        if parts.is_empty() {
            return Ok(String::new());
        }

        let joined = parts.join(&format!(" {} ", connective));
        if negated {
            Ok(format!("not ({})", joined))
        } else {
            Ok(format!("({})", joined))
        }
    }
}

/// Compile with default options
pub fn compile(tree: &[PredicateNode]) -> Result<String, FilterError> {
    FilterCompiler::default().compile(tree)
}

/// Format a `column operator value` comparison
///
/// A null value always compiles to `column eq null`, whatever the operator.
pub fn format_comparison(column: &str, operator: Operator, value: &Scalar) -> String {
    if matches!(value, Scalar::Null) {
        return format!("{} eq null", column);
    }

    if let Some(kind) = operator.pattern_kind() {
        return format_pattern(column, kind, value);
    }
    let token = operator.token().unwrap_or("eq");

    match value {
        Scalar::Null => format!("{} eq null", column),
        Scalar::Bool(b) => format!("{} {} {}", column, token, b),
        Scalar::Number(n) => format!("{} {} {}", column, token, n),
        Scalar::String(s) => format!("{} {} '{}'", column, token, escape_literal(s)),
    }
}

/// Format a `search.ismatch('<value>', '<column>')` fragment
///
/// Argument order is value first, then column.
pub fn format_pattern(column: &str, kind: PatternKind, value: &Scalar) -> String {
    let raw = scalar_text(value);
    let pattern = kind.wildcard(&raw);
    format!(
        "{}('{}', '{}')",
        MATCH_FUNCTION,
        escape_literal(&pattern),
        column
    )
}

/// Format a `search.in(<column>, '<a,b,c>', ',')` fragment
pub fn format_membership(
    column: &str,
    values: &[Scalar],
    path: &str,
) -> Result<String, FilterError> {
    let mut members = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Scalar::Null => {
                return Err(FilterError::malformed(
                    path,
                    format!("membership list for '{}' contains null", column),
                ));
            }
            Scalar::String(s) if s.contains(MEMBERSHIP_DELIMITER) => {
                return Err(FilterError::malformed(
                    path,
                    format!(
                        "membership value '{}' for '{}' contains the delimiter '{}'",
                        s, column, MEMBERSHIP_DELIMITER
                    ),
                ));
            }
            Scalar::String(s) => members.push(escape_literal(s)),
            other => members.push(scalar_text(other)),
        }
    }

    Ok(format!(
        "{}({}, '{}', '{}')",
        MEMBERSHIP_FUNCTION,
        column,
        members.join(&MEMBERSHIP_DELIMITER.to_string()),
        MEMBERSHIP_DELIMITER
    ))
}

/// Unquoted text of a scalar
fn scalar_text(value: &Scalar) -> String {
    match value {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::String(s) => s.clone(),
    }
}
