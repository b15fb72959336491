//! # An in-memory queryset over JSON rows
//!
//! [`MemoryQuery`] implements the [`Queryset`] boundary against a
//! plain `Vec<serde_json::Value>`. It is the reference collaborator
//! used by the test suite and the documentation examples; a real
//! storage backend would translate the same calls into its own query
//! expression instead.
//!
//! Like any conforming implementation it is lazy: `filter`, `exclude`,
//! `order_by`, `union` and `distinct` only record an operation, and
//! nothing is evaluated until [`to_vec`](MemoryQuery::to_vec) runs the
//! recorded chain.
//!
//! Relation paths traverse nested objects. Arrays match if any element
//! matches, and an empty array matches nothing. A `null` (or missing)
//! value satisfies only the `isnull=true` test.
//!
//! Example:
//! ```rust
//! use serde_json::json;
//! use sieve_query::lookups::LookupOp;
//! use sieve_query::memory::MemoryQuery;
//! use sieve_query::query::{Predicate, Queryset};
//! use sieve_query::values::FilterValue;
//!
//! let q = MemoryQuery::new(vec![
//!     json!({"name": "alice", "age": 34}),
//!     json!({"name": "bob", "age": 12}),
//! ]);
//! let adults = q.filter(&Predicate::new("age", LookupOp::Gt, FilterValue::Number(18.0)));
//! assert_eq!(adults.to_vec().len(), 1);
//! // The receiver is untouched.
//! assert_eq!(q.to_vec().len(), 2);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, trace};
use regex::RegexBuilder;
use serde_json::Value;

use crate::lookups::LookupOp;
use crate::query::{Predicate, Queryset, UNORDERED};
use crate::schema::RELATION_SEP;
use crate::values::FilterValue;

#[derive(Debug, Clone)]
enum Op {
    Filter(Predicate),
    Exclude(Predicate),
    OrderBy(String),
    Union(MemoryQuery),
    Distinct,
}

/// A lazy query over in-memory JSON rows.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    rows: Arc<Vec<Value>>,
    ops: Vec<Op>,
}

impl MemoryQuery {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: Arc::new(rows),
            ops: Vec::new(),
        }
    }

    fn chained(&self, op: Op) -> Self {
        let mut ops = self.ops.clone();
        ops.push(op);
        Self {
            rows: Arc::clone(&self.rows),
            ops,
        }
    }

    /// Run the recorded operation chain and return the matching rows.
    pub fn to_vec(&self) -> Vec<Value> {
        let mut out: Vec<Value> = self.rows.as_ref().clone();
        for op in &self.ops {
            match op {
                Op::Filter(pred) => {
                    trace!("filter {:?}", pred);
                    out.retain(|row| matches_row(row, pred));
                }
                Op::Exclude(pred) => {
                    trace!("exclude {:?}", pred);
                    out.retain(|row| !matches_row(row, pred));
                }
                Op::OrderBy(expr) => {
                    trace!("order_by {}", expr);
                    apply_order(&mut out, expr);
                }
                Op::Union(other) => {
                    trace!("union");
                    out.extend(other.to_vec());
                }
                Op::Distinct => {
                    trace!("distinct");
                    let mut seen = HashSet::new();
                    out.retain(|row| seen.insert(row.to_string()));
                }
            }
        }
        out
    }

    pub fn count(&self) -> usize {
        self.to_vec().len()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.to_vec().into_iter()
    }
}

impl Queryset for MemoryQuery {
    fn all(&self) -> Self {
        self.clone()
    }

    fn none(&self) -> Self {
        Self::new(Vec::new())
    }

    fn filter(&self, pred: &Predicate) -> Self {
        self.chained(Op::Filter(pred.clone()))
    }

    fn exclude(&self, pred: &Predicate) -> Self {
        self.chained(Op::Exclude(pred.clone()))
    }

    fn order_by(&self, expr: &str) -> Self {
        self.chained(Op::OrderBy(expr.to_string()))
    }

    fn union(&self, other: &Self) -> Self {
        self.chained(Op::Union(other.clone()))
    }

    fn distinct(&self) -> Self {
        self.chained(Op::Distinct)
    }
}

fn matches_row(row: &Value, pred: &Predicate) -> bool {
    let segments: Vec<&str> = pred.path.split(RELATION_SEP).collect();
    walk(row, &segments, pred.op, &pred.value)
}

fn walk(value: &Value, segments: &[&str], op: LookupOp, operand: &FilterValue) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|v| walk(v, segments, op, operand)),
        Value::Null => null_result(op, operand),
        _ => {
            if let Some((seg, rest)) = segments.split_first() {
                match value {
                    Value::Object(map) => match map.get(*seg) {
                        Some(v) => walk(v, rest, op, operand),
                        None => null_result(op, operand),
                    },
                    _ => false,
                }
            } else {
                cell_matches(value, op, operand)
            }
        }
    }
}

// A null cell satisfies only the positive isnull test.
fn null_result(op: LookupOp, operand: &FilterValue) -> bool {
    op == LookupOp::IsNull && matches!(operand, FilterValue::Bool(true))
}

fn cell_matches(cell: &Value, op: LookupOp, operand: &FilterValue) -> bool {
    match op {
        LookupOp::Exact => cell_eq(cell, operand),
        LookupOp::IExact => cell_str(cell).to_lowercase() == operand.to_string().to_lowercase(),
        LookupOp::Contains => cell_str(cell).contains(&operand.to_string()),
        LookupOp::IContains => cell_str(cell)
            .to_lowercase()
            .contains(&operand.to_string().to_lowercase()),
        LookupOp::In => match operand {
            FilterValue::Many(values) => values.iter().any(|v| cell_eq(cell, v)),
            single => cell_eq(cell, single),
        },
        LookupOp::Gt => matches!(cell_cmp(cell, operand), Some(Ordering::Greater)),
        LookupOp::Gte => matches!(
            cell_cmp(cell, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        LookupOp::Lt => matches!(cell_cmp(cell, operand), Some(Ordering::Less)),
        LookupOp::Lte => matches!(
            cell_cmp(cell, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        LookupOp::StartsWith => cell_str(cell).starts_with(&operand.to_string()),
        LookupOp::IStartsWith => cell_str(cell)
            .to_lowercase()
            .starts_with(&operand.to_string().to_lowercase()),
        LookupOp::EndsWith => cell_str(cell).ends_with(&operand.to_string()),
        LookupOp::IEndsWith => cell_str(cell)
            .to_lowercase()
            .ends_with(&operand.to_string().to_lowercase()),
        LookupOp::Range => match operand {
            FilterValue::Range(start, stop) => {
                matches!(
                    cell_cmp(cell, start),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(cell_cmp(cell, stop), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
        LookupOp::IsNull => !matches!(operand, FilterValue::Bool(true)),
        LookupOp::Regex => regex_match(cell, operand, false),
        LookupOp::IRegex => regex_match(cell, operand, true),
    }
}

fn regex_match(cell: &Value, operand: &FilterValue, case_insensitive: bool) -> bool {
    let pattern = operand.to_string();
    match RegexBuilder::new(&pattern)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(re) => re.is_match(&cell_str(cell)),
        Err(e) => {
            debug!("invalid regex pattern '{}': {}", pattern, e);
            false
        }
    }
}

fn cell_eq(cell: &Value, operand: &FilterValue) -> bool {
    match (cell.as_f64(), operand_f64(operand)) {
        (Some(a), Some(b)) => a == b,
        _ => cell_str(cell) == operand.to_string(),
    }
}

fn cell_cmp(cell: &Value, operand: &FilterValue) -> Option<Ordering> {
    match (cell.as_f64(), operand_f64(operand)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        // Dates and times serialize to ISO strings, which order
        // lexically.
        _ => Some(cell_str(cell).cmp(&operand.to_string())),
    }
}

fn operand_f64(operand: &FilterValue) -> Option<f64> {
    match operand {
        FilterValue::Number(n) => Some(*n),
        FilterValue::Text(t) => t.parse().ok(),
        _ => None,
    }
}

fn cell_str(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn apply_order(rows: &mut [Value], expr: &str) {
    if expr == UNORDERED {
        return;
    }
    let (field, descending) = match expr.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (expr, false),
    };
    let segments: Vec<&str> = field.split(RELATION_SEP).collect();
    rows.sort_by(|a, b| {
        let ord = json_cmp(lookup_cell(a, &segments), lookup_cell(b, &segments));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

fn lookup_cell<'a>(row: &'a Value, segments: &[&str]) -> &'a Value {
    let mut current = row;
    for seg in segments {
        match current {
            Value::Object(map) => match map.get(*seg) {
                Some(v) => current = v,
                None => return &Value::Null,
            },
            _ => return &Value::Null,
        }
    }
    current
}

fn json_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => cell_str(a).cmp(&cell_str(b)),
    }
}
