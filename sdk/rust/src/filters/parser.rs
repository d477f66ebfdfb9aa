//! Predicate parsing
//!
//! Turns the loosely-typed `wheres` JSON a query builder accumulates into a
//! typed predicate tree. Typed nodes carry a `type` (or `kind`) tag; untagged
//! objects are `column: value` equality shorthand; bare strings are
//! pre-formed fragments.

use serde_json::{Map, Value};

use super::compiler::CompilerOptions;
use super::error::FilterError;
use super::types::{Connective, Operator, PatternKind, PredicateNode, Scalar};

/// Maximum size of predicate JSON in bytes (64KB)
const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Parse predicates from a JSON document
///
/// Validates size, then parses with the given options.
pub fn parse_predicates(
    json_str: &str,
    options: CompilerOptions,
) -> Result<Vec<PredicateNode>, FilterError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::InputTooLarge {
            max_bytes: MAX_FILTER_JSON_SIZE,
        });
    }

    let value: Value =
        serde_json::from_str(json_str).map_err(|e| FilterError::InvalidJson(e.to_string()))?;

    PredicateParser::new(options).parse_value(&value)
}

/// Converts JSON predicate input into [`PredicateNode`]s
#[derive(Debug, Clone, Copy)]
pub struct PredicateParser {
    options: CompilerOptions,
}

impl PredicateParser {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Parse a top-level predicate value
    ///
    /// Accepts an array of entries, a single object, or `null` (no predicates).
    pub fn parse_value(&self, value: &Value) -> Result<Vec<PredicateNode>, FilterError> {
        let mut nodes = Vec::new();
        match value {
            Value::Null => {}
            Value::Array(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    let path = format!("wheres[{}]", i);
                    self.collect_entry(entry, &path, 1, &mut nodes)?;
                }
            }
            Value::Object(_) => self.collect_entry(value, "wheres", 1, &mut nodes)?,
            _ => {
                return Err(FilterError::malformed(
                    "wheres",
                    "expected an array or an object of predicates",
                ));
            }
        }
        Ok(nodes)
    }

    /// Parse one entry into `out`, dropping it in lenient mode when it is malformed
    fn collect_entry(
        &self,
        entry: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<PredicateNode>,
    ) -> Result<(), FilterError> {
        match self.parse_entry(entry, path, depth) {
            Ok(nodes) => {
                out.extend(nodes);
                Ok(())
            }
            Err(e) if !self.options.strict && e.is_node_local() => {
                tracing::warn!(path = %path, error = %e, "Dropping predicate");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn parse_entry(
        &self,
        entry: &Value,
        path: &str,
        depth: usize,
    ) -> Result<Vec<PredicateNode>, FilterError> {
        if depth > self.options.max_depth {
            return Err(FilterError::RecursionLimitExceeded {
                max_depth: self.options.max_depth,
            });
        }

        match entry {
            Value::String(fragment) => Ok(vec![PredicateNode::Fragment(fragment.clone())]),
            Value::Object(map) if map.contains_key("type") || map.contains_key("kind") => {
                Ok(vec![self.parse_typed(map, path, depth)?])
            }
            Value::Object(map) => parse_shorthand(map, path),
            other => Err(FilterError::malformed(
                path,
                format!("expected an object or a string, got {}", json_type(other)),
            )),
        }
    }

    fn parse_typed(
        &self,
        map: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<PredicateNode, FilterError> {
        let tag = match map.get("type").or_else(|| map.get("kind")) {
            Some(Value::String(tag)) => tag,
            _ => return Err(FilterError::malformed(path, "kind tag must be a string")),
        };
        let normalized: String = tag
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "basic" => {
                let column = required_column(map, path)?;
                let operator = optional_operator(map, path)?.unwrap_or(Operator::Eq);
                let value = required_scalar(map, "value", path)?;
                Ok(PredicateNode::Basic {
                    column,
                    operator,
                    value,
                })
            }
            "like" | "startswith" | "endswith" | "contains" => {
                let column = required_column(map, path)?;
                let value = required_scalar(map, "value", path)?;
                let derived = match normalized.as_str() {
                    "startswith" => PatternKind::StartsWith,
                    "endswith" => PatternKind::EndsWith,
                    "contains" => PatternKind::Contains,
                    _ => PatternKind::Like,
                };
                // An explicit operator takes precedence over the tag
                match optional_operator(map, path)? {
                    Some(op) if op.pattern_kind().is_none() => Ok(PredicateNode::Basic {
                        column,
                        operator: op,
                        value,
                    }),
                    Some(op) => Ok(PredicateNode::Pattern {
                        column,
                        kind: op.pattern_kind().unwrap_or(derived),
                        value,
                    }),
                    None => Ok(PredicateNode::Pattern {
                        column,
                        kind: derived,
                        value,
                    }),
                }
            }
            "null" => Ok(PredicateNode::Null {
                column: required_column(map, path)?,
            }),
            "notnull" => Ok(PredicateNode::NotNull {
                column: required_column(map, path)?,
            }),
            "in" => Ok(PredicateNode::In {
                column: required_column(map, path)?,
                values: required_members(map, path)?,
            }),
            "notin" => Ok(PredicateNode::NotIn {
                column: required_column(map, path)?,
                values: required_members(map, path)?,
            }),
            "boolean" => Ok(PredicateNode::Boolean {
                column: required_column(map, path)?,
                value: required_bool(map, path)?,
            }),
            "raw" => {
                let expression = ["rawExpression", "sql", "expression"]
                    .iter()
                    .find_map(|key| map.get(*key));
                match expression {
                    Some(Value::String(s)) => Ok(PredicateNode::Raw {
                        expression: s.clone(),
                    }),
                    Some(other) => Err(FilterError::malformed(
                        path,
                        format!("raw expression must be a string, got {}", json_type(other)),
                    )),
                    None => Err(FilterError::malformed(path, "missing 'rawExpression'")),
                }
            }
            "group" => self.parse_group(map, path, depth),
            _ => Err(FilterError::unsupported_kind(path, tag.trim())),
        }
    }

    fn parse_group(
        &self,
        map: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<PredicateNode, FilterError> {
        let connective = match map.get("connective").or_else(|| map.get("boolean")) {
            None | Some(Value::Null) => Connective::And,
            Some(Value::String(s)) => s
                .parse()
                .map_err(|e: String| FilterError::malformed(path, e))?,
            Some(other) => {
                return Err(FilterError::malformed(
                    path,
                    format!("connective must be a string, got {}", json_type(other)),
                ));
            }
        };

        let negated = match map.get("not") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(FilterError::malformed(
                    path,
                    format!("'not' must be a boolean, got {}", json_type(other)),
                ));
            }
        };

        let entries = match map.get("conditions") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(FilterError::malformed(
                    path,
                    format!("'conditions' must be an array, got {}", json_type(other)),
                ));
            }
            None => return Err(FilterError::malformed(path, "missing 'conditions'")),
        };

        let mut conditions = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let child_path = format!("{}.conditions[{}]", path, i);
            self.collect_entry(entry, &child_path, depth + 1, &mut conditions)?;
        }

        Ok(PredicateNode::Group {
            connective,
            negated,
            conditions,
        })
    }
}

/// `{"status": "active", "age": 18}` → one equality node per entry, in key order
fn parse_shorthand(
    map: &Map<String, Value>,
    path: &str,
) -> Result<Vec<PredicateNode>, FilterError> {
    map.iter()
        .map(|(column, value)| {
            let entry_path = format!("{}.{}", path, column);
            Ok(PredicateNode::Basic {
                column: column.clone(),
                operator: Operator::Eq,
                value: to_scalar(value, &entry_path)?,
            })
        })
        .collect()
}

fn required_column(map: &Map<String, Value>, path: &str) -> Result<String, FilterError> {
    match map.get("column").or_else(|| map.get("field")) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(FilterError::malformed(path, "'column' is empty")),
        Some(other) => Err(FilterError::malformed(
            path,
            format!("'column' must be a string, got {}", json_type(other)),
        )),
        None => Err(FilterError::malformed(path, "missing 'column'")),
    }
}

fn optional_operator(
    map: &Map<String, Value>,
    path: &str,
) -> Result<Option<Operator>, FilterError> {
    match map.get("operator") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| FilterError::unsupported_operator(path, s.as_str())),
        Some(other) => Err(FilterError::unsupported_operator(path, other.to_string())),
    }
}

/// Absent value is malformed; an explicit `null` is a valid null comparison
fn required_scalar(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Scalar, FilterError> {
    match map.get(key) {
        Some(value) => to_scalar(value, path),
        None => Err(FilterError::malformed(path, format!("missing '{}'", key))),
    }
}

fn required_members(map: &Map<String, Value>, path: &str) -> Result<Vec<Scalar>, FilterError> {
    let members = match map.get("values").or_else(|| map.get("value")) {
        Some(Value::Array(members)) => members,
        Some(other) => {
            return Err(FilterError::malformed(
                path,
                format!("membership values must be an array, got {}", json_type(other)),
            ));
        }
        None => return Err(FilterError::malformed(path, "missing 'values'")),
    };

    members
        .iter()
        .map(|member| match member {
            Value::Null => Err(FilterError::malformed(
                path,
                "membership values must not contain null",
            )),
            other => to_scalar(other, path),
        })
        .collect()
}

/// Booleans, or the integers 0 and 1
fn required_bool(map: &Map<String, Value>, path: &str) -> Result<bool, FilterError> {
    match map.get("value") {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(false),
        Some(Value::Number(n)) if n.as_u64() == Some(1) => Ok(true),
        Some(other) => Err(FilterError::malformed(
            path,
            format!("boolean value expected, got {}", other),
        )),
        None => Err(FilterError::malformed(path, "missing 'value'")),
    }
}

fn to_scalar(value: &Value, path: &str) -> Result<Scalar, FilterError> {
    match value {
        Value::Null => Ok(Scalar::Null),
        Value::Bool(b) => Ok(Scalar::Bool(*b)),
        Value::Number(n) => Ok(Scalar::Number(n.clone())),
        Value::String(s) => Ok(Scalar::String(s.clone())),
        other => Err(FilterError::malformed(
            path,
            format!("expected a scalar value, got {}", json_type(other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn strict() -> PredicateParser {
        PredicateParser::new(CompilerOptions::default())
    }

    fn lenient() -> PredicateParser {
        PredicateParser::new(CompilerOptions::lenient())
    }

    #[test]
    fn parse_typed_basic() {
        let nodes = strict()
            .parse_value(&json!([
                {"type": "Basic", "column": "age", "operator": ">", "value": 18}
            ]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![PredicateNode::basic("age", Operator::Gt, 18)]
        );
    }

    #[test]
    fn parse_accepts_kind_tag_and_field_alias() {
        let nodes = strict()
            .parse_value(&json!([{"kind": " not null ", "field": "email"}]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![PredicateNode::NotNull {
                column: "email".to_string()
            }]
        );
    }

    #[test]
    fn parse_basic_defaults_to_equality() {
        let nodes = strict()
            .parse_value(&json!([{"type": "basic", "column": "name", "value": "x"}]))
            .unwrap();
        assert_eq!(nodes, vec![PredicateNode::eq("name", "x")]);
    }

    #[test]
    fn parse_basic_explicit_null_value() {
        let nodes = strict()
            .parse_value(&json!([{"type": "Basic", "column": "a", "operator": "<", "value": null}]))
            .unwrap();
        assert_eq!(nodes, vec![PredicateNode::basic("a", Operator::Lt, Scalar::Null)]);
    }

    #[test]
    fn parse_missing_value_is_malformed() {
        let err = strict()
            .parse_value(&json!([
                {"type": "Basic", "column": "a", "value": 1},
                {"type": "Basic", "column": "b", "operator": "="}
            ]))
            .unwrap_err();
        assert_eq!(err, FilterError::malformed("wheres[1]", "missing 'value'"));
    }

    #[test]
    fn parse_missing_column_is_malformed() {
        let err = strict()
            .parse_value(&json!([{"type": "Null"}]))
            .unwrap_err();
        assert_eq!(err, FilterError::malformed("wheres[0]", "missing 'column'"));
    }

    #[test]
    fn parse_unknown_operator() {
        let err = strict()
            .parse_value(&json!([{"type": "Basic", "column": "a", "operator": "~=", "value": 1}]))
            .unwrap_err();
        assert_eq!(err, FilterError::unsupported_operator("wheres[0]", "~="));
    }

    #[test]
    fn parse_pattern_kinds() {
        let nodes = strict()
            .parse_value(&json!([
                {"type": "Like", "column": "d", "value": "t"},
                {"type": "StartsWith", "column": "n", "value": "Dr."},
                {"type": "EndsWith", "column": "e", "value": "@x"},
                {"type": "Contains", "column": "c", "value": "y"}
            ]))
            .unwrap();
        let kinds: Vec<_> = nodes
            .iter()
            .map(|n| match n {
                PredicateNode::Pattern { kind, .. } => *kind,
                other => panic!("unexpected node {:?}", other),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                PatternKind::Like,
                PatternKind::StartsWith,
                PatternKind::EndsWith,
                PatternKind::Contains
            ]
        );
    }

    #[test]
    fn parse_pattern_explicit_operator_wins() {
        let nodes = strict()
            .parse_value(&json!([
                {"type": "Like", "column": "n", "operator": "starts", "value": "Dr."}
            ]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![PredicateNode::pattern("n", PatternKind::StartsWith, "Dr.")]
        );
    }

    #[test]
    fn parse_membership_from_value_or_values() {
        let nodes = strict()
            .parse_value(&json!([
                {"type": "In", "column": "status", "value": ["active", "pending"]},
                {"type": "NotIn", "column": "id", "values": [1, 2]}
            ]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                PredicateNode::is_in("status", ["active", "pending"]),
                PredicateNode::not_in("id", [1, 2]),
            ]
        );
    }

    #[test]
    fn parse_membership_rejects_non_array() {
        let err = strict()
            .parse_value(&json!([{"type": "In", "column": "status", "value": "active"}]))
            .unwrap_err();
        assert!(matches!(err, FilterError::MalformedPredicate { .. }));
    }

    #[test]
    fn parse_boolean_accepts_zero_and_one() {
        let nodes = strict()
            .parse_value(&json!([
                {"type": "Boolean", "column": "a", "value": 1},
                {"type": "Boolean", "column": "b", "value": false}
            ]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                PredicateNode::Boolean {
                    column: "a".to_string(),
                    value: true
                },
                PredicateNode::Boolean {
                    column: "b".to_string(),
                    value: false
                },
            ]
        );
    }

    #[test]
    fn parse_raw_aliases() {
        let nodes = strict()
            .parse_value(&json!([
                {"type": "Raw", "sql": "name eq 'John'"},
                {"type": "Raw", "rawExpression": "a = 1"}
            ]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                PredicateNode::Raw {
                    expression: "name eq 'John'".to_string()
                },
                PredicateNode::Raw {
                    expression: "a = 1".to_string()
                },
            ]
        );
    }

    #[test]
    fn parse_group_with_boolean_alias() {
        let nodes = strict()
            .parse_value(&json!([{
                "type": "Group",
                "boolean": "OR",
                "conditions": [
                    {"type": "Basic", "column": "a", "operator": "=", "value": 1},
                    {"b": 2}
                ]
            }]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![PredicateNode::group(
                Connective::Or,
                vec![PredicateNode::eq("a", 1), PredicateNode::eq("b", 2)]
            )]
        );
    }

    #[test]
    fn parse_group_missing_conditions() {
        let err = strict()
            .parse_value(&json!([{"type": "Group", "boolean": "and"}]))
            .unwrap_err();
        assert_eq!(err, FilterError::malformed("wheres[0]", "missing 'conditions'"));
    }

    #[test]
    fn parse_nested_error_reports_path() {
        let err = strict()
            .parse_value(&json!([
                {"b": 1},
                {"type": "Group", "conditions": [{"type": "Unknown", "column": "x"}]}
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::unsupported_kind("wheres[1].conditions[0]", "Unknown")
        );
    }

    #[test]
    fn parse_shorthand_object() {
        let nodes = strict()
            .parse_value(&json!({"status": "active", "age": 18, "deleted": null}))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                PredicateNode::eq("status", "active"),
                PredicateNode::eq("age", 18),
                PredicateNode::eq("deleted", Scalar::Null),
            ]
        );
    }

    #[test]
    fn parse_positional_fragment() {
        let nodes = strict()
            .parse_value(&json!(["rating ge 4", {"type": "Null", "column": "x"}]))
            .unwrap();
        assert_eq!(nodes[0], PredicateNode::Fragment("rating ge 4".to_string()));
    }

    #[test]
    fn parse_rejects_scalar_entries() {
        let err = strict().parse_value(&json!([42])).unwrap_err();
        assert!(matches!(err, FilterError::MalformedPredicate { .. }));
        assert!(strict().parse_value(&json!("x")).is_err());
    }

    #[test]
    fn parse_null_input_is_empty() {
        assert!(strict().parse_value(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn lenient_drops_bad_entries() {
        let nodes = lenient()
            .parse_value(&json!([
                {"type": "Basic", "column": "a", "value": 1},
                {"type": "Basic", "value": 2},
                {"type": "Between", "column": "c"},
                {"type": "Group", "conditions": [{"type": "In", "column": "d"}, {"e": 5}]}
            ]))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                PredicateNode::eq("a", 1),
                PredicateNode::group(Connective::And, vec![PredicateNode::eq("e", 5)]),
            ]
        );
    }

    #[test]
    fn depth_limit_applies_while_parsing() {
        let mut value = json!({"type": "Null", "column": "x"});
        for _ in 0..4 {
            value = json!({"type": "Group", "conditions": [value]});
        }
        let parser = PredicateParser::new(CompilerOptions {
            max_depth: 3,
            strict: false,
        });
        assert_eq!(
            parser.parse_value(&json!([value])).unwrap_err(),
            FilterError::RecursionLimitExceeded { max_depth: 3 }
        );
    }

    #[test]
    fn parse_predicates_rejects_invalid_json() {
        let result = parse_predicates("not valid json", CompilerOptions::default());
        assert!(matches!(result, Err(FilterError::InvalidJson(_))));
    }

    #[test]
    fn parse_predicates_rejects_oversized_input() {
        let big = format!("[\"{}\"]", "a".repeat(MAX_FILTER_JSON_SIZE));
        assert_eq!(
            parse_predicates(&big, CompilerOptions::default()).unwrap_err(),
            FilterError::InputTooLarge {
                max_bytes: MAX_FILTER_JSON_SIZE
            }
        );
    }
}
