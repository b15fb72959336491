//! # The comparison-operator vocabulary
//!
//! Filterable fields accept a fixed set of comparison operators:
//! equality, case-insensitive equality, containment, ordering
//! comparisons, range, null check and pattern match, each with a
//! negated counterpart. A negated lookup accepts exactly the rows its
//! positive form rejects, over the same domain.
//!
//! On the wire an operator is a short id such as `exact`, `icontains`
//! or `gt`; a negated operator carries the `ex_` marker, for example
//! `ex_contains`. Internally negation is structural: a [`Lookup`] is an
//! `(operator, negated)` pair and the marker is parsed exactly once, at
//! the input boundary.
//!
//! Example:
//! ```rust
//! use sieve_query::lookups::{Lookup, LookupOp};
//!
//! let lk = Lookup::parse("ex_contains").unwrap();
//! assert_eq!(lk.op, LookupOp::Contains);
//! assert!(lk.negated);
//! assert_eq!(lk.id(), "ex_contains");
//!
//! // Unknown ids never fail; they fall back to plain equality.
//! assert_eq!(Lookup::parse_or_exact("frobnicate"), Lookup::new(LookupOp::Exact));
//! ```

use std::fmt;
use std::str::FromStr;

use log::debug;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Marker prefix that turns an operator id into its negated form.
pub const NEGATION_MARKER: &str = "ex_";

/// The positive comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum LookupOp {
    Exact,
    IExact,
    Contains,
    IContains,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Range,
    IsNull,
    Regex,
    IRegex,
}

/// One comparison operator, possibly negated.
///
/// The pair is plain data; the inversion of inclusion for negated
/// lookups is applied where predicates are built, by routing through
/// the query's exclusion path instead of its filter path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lookup {
    pub op: LookupOp,
    pub negated: bool,
}

impl Lookup {
    /// A positive lookup for `op`.
    pub const fn new(op: LookupOp) -> Self {
        Self { op, negated: false }
    }

    /// The negated lookup for `op`.
    pub const fn negated(op: LookupOp) -> Self {
        Self { op, negated: true }
    }

    /// The wire id, with the negation marker applied when needed.
    pub fn id(&self) -> String {
        if self.negated {
            format!("{}{}", NEGATION_MARKER, self.op)
        } else {
            self.op.to_string()
        }
    }

    /// Parse a wire id. Returns `None` for ids outside the vocabulary.
    pub fn parse(id: &str) -> Option<Self> {
        let (raw, negated) = match id.strip_prefix(NEGATION_MARKER) {
            Some(rest) => (rest, true),
            None => (id, false),
        };
        LookupOp::from_str(raw).ok().map(|op| Lookup { op, negated })
    }

    /// Parse a wire id, falling back to positive `exact` for empty or
    /// unrecognized input. The fallback is policy, not an error.
    pub fn parse_or_exact(id: &str) -> Self {
        if id.is_empty() {
            return Lookup::new(LookupOp::Exact);
        }
        Lookup::parse(id).unwrap_or_else(|| {
            debug!("unknown lookup id '{}', falling back to exact", id);
            Lookup::new(LookupOp::Exact)
        })
    }

    /// Display label for choice widgets.
    pub fn label(&self) -> &'static str {
        use LookupOp::*;
        if self.negated {
            match self.op {
                Exact | IExact => "Different",
                Contains | IContains | In => "Not contains",
                Gt => "Not greater than",
                Gte => "Not greater than or equal",
                Lt => "Not lower than",
                Lte => "Not lower than or equal",
                StartsWith | IStartsWith => "Not starts with",
                EndsWith | IEndsWith => "Not ends with",
                Range => "Outside range",
                IsNull => "Is not null",
                Regex | IRegex => "Not matching",
            }
        } else {
            match self.op {
                Exact | IExact => "Exact",
                Contains | IContains | In => "Contains",
                Gt => "Greater than",
                Gte => "Greater than or equal",
                Lt => "Lower than",
                Lte => "Lower than or equal",
                StartsWith | IStartsWith => "Starts with",
                EndsWith | IEndsWith => "Ends with",
                Range => "Range",
                IsNull => "Is null",
                Regex | IRegex => "Regular expression",
            }
        }
    }

    /// The whole vocabulary: every positive operator followed by its
    /// negated counterpart, in declaration order.
    pub fn all() -> Vec<Lookup> {
        let mut v = Vec::new();
        for op in LookupOp::iter() {
            v.push(Lookup::new(op));
        }
        for op in LookupOp::iter() {
            v.push(Lookup::negated(op));
        }
        v
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl From<LookupOp> for Lookup {
    fn from(op: LookupOp) -> Self {
        Lookup::new(op)
    }
}
