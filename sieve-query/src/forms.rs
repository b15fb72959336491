//! # Request input and its validation
//!
//! Raw input arrives as an HTTP-style key/value map ([`QueryMap`]).
//! A [`Form`] is a flat collection of named validation slots assembled
//! at request time; it knows how to locate a slot's raw input under the
//! form's prefix and clean it into a typed
//! [`FilterValue`](crate::values::FilterValue).
//!
//! Key conventions: a scalar slot named `age` on a form with prefix `2`
//! reads `2-age`. Multi-part slots append a small integer suffix: a
//! lookup-choice slot reads the operator id from `2-age_0` and the
//! value from `2-age_1`; a range slot reads its bounds from `2-age_0`
//! and `2-age_1`.
//!
//! Example:
//! ```rust
//! use sieve_query::forms::{Form, QueryMap, Slot, SlotKind};
//! use sieve_query::values::FilterValue;
//!
//! let mut form = Form::new(Some("1".to_string()));
//! form.register_slot(Slot::new("age", SlotKind::Number));
//!
//! let data = QueryMap::from_pairs([("1-age", "30")]);
//! let cleaned = form.clean("age", &data).unwrap();
//! assert_eq!(cleaned, Some(FilterValue::Number(30.0)));
//!
//! // Absent input is not an error; the filter is simply a no-op.
//! assert_eq!(form.clean("age", &QueryMap::new()).unwrap(), None);
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::lookups::Lookup;
use crate::values::FilterValue;

/// Reserved input key naming the ordering field.
pub const ORDER_BY_KEY: &str = "o";
/// Reserved input key naming the ordering direction.
pub const ORDER_DIRECTION_KEY: &str = "sort_direction";
/// The only direction value that means descending.
pub const DESCENDING_MARKER: &str = "-";

/// A single field's input failed validation. Recovered per field: the
/// offending filter is skipped and processing continues.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("a value for '{0}' is required")]
    Required(String),
    #[error("invalid value for '{field}'")]
    Invalid {
        field: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("'{1}' is not one of the available choices for '{0}'")]
    UnknownChoice(String, String),
}

/// Raw request input: string keys, one or more string values per key.
#[derive(Debug, Clone, Default)]
pub struct QueryMap {
    entries: HashMap<String, Vec<String>>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Self::new();
        for (k, v) in pairs {
            map.insert(k, v);
        }
        map
    }

    /// Append a value under `key`; repeated keys accumulate.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|vs| vs.first())
            .map(|s| s.as_str())
    }

    /// All values for `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(|vs| vs.as_slice()).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The input type of a validation slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotKind {
    Text,
    Number,
    Boolean,
    Date,
    DateTime,
    Time,
    /// One of a fixed set of `(value, label)` choices.
    Choice(Vec<(String, String)>),
    /// Any subset of a fixed set of choices.
    MultiChoice(Vec<(String, String)>),
    /// Zero or more values of the inner kind, from repeated keys.
    Many(Box<SlotKind>),
    /// A `(start, stop)` pair of the inner kind.
    Range(Box<SlotKind>),
    /// An `(operator, value)` pair: the operator id is one of
    /// `lookups`, the value is of the inner kind.
    LookupChoice {
        value: Box<SlotKind>,
        lookups: Vec<Lookup>,
    },
}

/// One named validation slot.
#[derive(Debug, Clone)]
pub struct Slot {
    pub name: String,
    pub label: String,
    pub kind: SlotKind,
    pub required: bool,
}

impl Slot {
    pub fn new(name: impl Into<String>, kind: SlotKind) -> Self {
        let name = name.into();
        let label = capfirst(&name);
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// A flat, schema-less validation form: named slots plus an input-key
/// prefix. Built once per bound filter set and memoized there.
#[derive(Debug, Clone, Default)]
pub struct Form {
    prefix: Option<String>,
    slots: Vec<Slot>,
}

impl Form {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix,
            slots: Vec::new(),
        }
    }

    pub fn register_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The full input key for a slot name, under this form's prefix.
    pub fn key_for(&self, name: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{}-{}", p, name),
            None => name.to_string(),
        }
    }

    /// Validate the raw input for the named slot.
    ///
    /// `Ok(None)` means the slot had no usable input and the matching
    /// filter must be a no-op. Unknown slot names also clean to
    /// `Ok(None)`.
    pub fn clean(
        &self,
        name: &str,
        data: &QueryMap,
    ) -> Result<Option<FilterValue>, ValidationError> {
        let slot = match self.slot(name) {
            Some(slot) => slot,
            None => return Ok(None),
        };
        let key = self.key_for(name);
        let cleaned = clean_kind(&slot.kind, &slot.name, &key, data)?;
        if cleaned.is_none() && slot.required {
            return Err(ValidationError::Required(slot.name.clone()));
        }
        Ok(cleaned)
    }
}

fn nonempty<'a>(data: &'a QueryMap, key: &str) -> Option<&'a str> {
    data.get(key).filter(|v| !v.is_empty())
}

fn clean_kind(
    kind: &SlotKind,
    name: &str,
    key: &str,
    data: &QueryMap,
) -> Result<Option<FilterValue>, ValidationError> {
    match kind {
        SlotKind::Text
        | SlotKind::Number
        | SlotKind::Boolean
        | SlotKind::Date
        | SlotKind::DateTime
        | SlotKind::Time => match nonempty(data, key) {
            Some(raw) => clean_scalar(kind, name, raw).map(Some),
            None => Ok(None),
        },
        SlotKind::Choice(choices) => match nonempty(data, key) {
            Some(raw) => {
                if choices.iter().any(|(v, _)| v == raw) {
                    Ok(Some(FilterValue::text(raw)))
                } else {
                    Err(ValidationError::UnknownChoice(
                        name.to_string(),
                        raw.to_string(),
                    ))
                }
            }
            None => Ok(None),
        },
        SlotKind::MultiChoice(choices) => {
            let mut values = Vec::new();
            for raw in data.get_all(key) {
                if raw.is_empty() {
                    continue;
                }
                if !choices.iter().any(|(v, _)| v == raw) {
                    return Err(ValidationError::UnknownChoice(
                        name.to_string(),
                        raw.clone(),
                    ));
                }
                values.push(FilterValue::text(raw.clone()));
            }
            if values.is_empty() {
                Ok(None)
            } else {
                Ok(Some(FilterValue::Many(values)))
            }
        }
        SlotKind::Many(inner) => {
            let mut values = Vec::new();
            for raw in data.get_all(key) {
                if raw.is_empty() {
                    continue;
                }
                values.push(clean_scalar(inner, name, raw)?);
            }
            if values.is_empty() {
                Ok(None)
            } else {
                Ok(Some(FilterValue::Many(values)))
            }
        }
        SlotKind::Range(inner) => {
            let start = nonempty(data, &format!("{}_0", key));
            let stop = nonempty(data, &format!("{}_1", key));
            match (start, stop) {
                (Some(start), Some(stop)) => {
                    let start = clean_scalar(inner, name, start)?;
                    let stop = clean_scalar(inner, name, stop)?;
                    Ok(Some(FilterValue::Range(Box::new(start), Box::new(stop))))
                }
                // A missing or partially-empty range is a no-op.
                _ => Ok(None),
            }
        }
        SlotKind::LookupChoice { value, lookups } => {
            let raw = match nonempty(data, &format!("{}_1", key)) {
                Some(raw) => raw,
                None => return Ok(None),
            };
            let id = data.get(&format!("{}_0", key)).unwrap_or("");
            let mut lookup = Lookup::parse_or_exact(id);
            if !lookups.contains(&lookup) && !id.is_empty() {
                log::debug!(
                    "lookup '{}' is not offered for '{}', falling back to exact",
                    id,
                    name
                );
                lookup = Lookup::parse_or_exact("");
            }
            let cleaned = clean_scalar(value, name, raw)?;
            Ok(Some(FilterValue::WithLookup(lookup, Box::new(cleaned))))
        }
    }
}

fn clean_scalar(kind: &SlotKind, name: &str, raw: &str) -> Result<FilterValue, ValidationError> {
    let invalid = |source: anyhow::Error| ValidationError::Invalid {
        field: name.to_string(),
        source,
    };
    match kind {
        SlotKind::Text => Ok(FilterValue::text(raw)),
        SlotKind::Number => f64::from_str(raw)
            .map(FilterValue::Number)
            .map_err(|e| invalid(e.into())),
        SlotKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(FilterValue::Bool(true)),
            "false" | "0" => Ok(FilterValue::Bool(false)),
            other => Err(invalid(anyhow!("'{}' is not a boolean", other))),
        },
        SlotKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(FilterValue::Date)
            .map_err(|e| invalid(e.into())),
        SlotKind::DateTime => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
            .map(FilterValue::DateTime)
            .map_err(|e| invalid(e.into())),
        SlotKind::Time => NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .map(FilterValue::Time)
            .map_err(|e| invalid(e.into())),
        other => Err(invalid(anyhow!(
            "slot kind {:?} cannot clean a single value",
            other
        ))),
    }
}

pub(crate) fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
