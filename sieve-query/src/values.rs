//! Typed values produced by input validation.
//!
//! Raw input is always text; the validation form turns it into a
//! [`FilterValue`] before any predicate is built, so predicate
//! construction never sees unparsed input.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::lookups::Lookup;

/// A cleaned input value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Several values, for set-membership filters.
    Many(Vec<FilterValue>),
    /// Inclusive bounds, for between-bounds filters.
    Range(Box<FilterValue>, Box<FilterValue>),
    /// A value together with the operator the caller chose for it.
    WithLookup(Lookup, Box<FilterValue>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    /// The value with any operator wrapper removed.
    pub fn unwrapped(&self) -> &FilterValue {
        match self {
            FilterValue::WithLookup(_, inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "{}", s),
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FilterValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            FilterValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            FilterValue::Many(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            FilterValue::Range(start, stop) => write!(f, "{}..{}", start, stop),
            FilterValue::WithLookup(lookup, v) => write!(f, "{}:{}", lookup, v),
        }
    }
}
