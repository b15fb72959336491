//! # Restricting a bound set to the fields actually submitted
//!
//! A [`DynamicFilterSet`] wraps a bound
//! [`FilterSet`](crate::filterset::FilterSet) for UIs where the caller
//! picks which fields to filter by, row by row. Active fields are
//! detected from the bound input keys: the form prefix and any
//! trailing `_<n>` part suffix are stripped, and whatever remains is
//! matched against the descriptor set.
//!
//! The restriction affects only the rendered form: the dynamic form
//! carries a `select_field` picker over every available field plus
//! input slots for the active fields alone. Query composition still
//! runs over the full descriptor set; fields outside the active subset
//! stay no-ops because their raw input is absent.

use std::sync::Arc;

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde_json::{json, Value};

use crate::filterset::{FilterSet, FilterSetDef};
use crate::forms::{Form, QueryMap, Slot, SlotKind};
use crate::query::Queryset;

/// Slot name of the field picker in the dynamic form.
pub const SELECT_FIELD_KEY: &str = "select_field";

// trailing part suffix of multi-part input keys
static PART_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[0-9]+$").expect("static pattern"));

/// Metadata describing one available filter, for building a picker.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOption {
    pub name: String,
    pub label: String,
    pub widget: String,
    pub filter: String,
}

/// A filter set whose rendered form follows the submitted input keys.
#[derive(Debug)]
pub struct DynamicFilterSet<Q: Queryset> {
    inner: FilterSet<Q>,
    active: OnceCell<Vec<String>>,
    dynamic_form: OnceCell<Form>,
}

impl<Q: Queryset> DynamicFilterSet<Q> {
    pub fn new(inner: FilterSet<Q>) -> Self {
        Self {
            inner,
            active: OnceCell::new(),
            dynamic_form: OnceCell::new(),
        }
    }

    pub fn bind(def: &Arc<FilterSetDef>, data: QueryMap, base: Q) -> Self {
        Self::new(FilterSet::bound(def, data, base))
    }

    pub fn bind_prefixed(
        def: &Arc<FilterSetDef>,
        data: QueryMap,
        base: Q,
        prefix: impl Into<String>,
    ) -> Self {
        Self::new(FilterSet::bound_prefixed(def, data, base, prefix))
    }

    pub fn unbound_prefixed(def: &Arc<FilterSetDef>, base: Q, prefix: impl Into<String>) -> Self {
        Self::new(FilterSet::unbound_prefixed(def, base, prefix))
    }

    pub fn inner(&self) -> &FilterSet<Q> {
        &self.inner
    }

    pub fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    /// The composed result query, over the *full* descriptor set.
    pub fn qs(&self) -> &Q {
        self.inner.qs()
    }

    /// Field names present among the bound input keys, in descriptor
    /// order. Empty for unbound sets.
    pub fn active_fields(&self) -> &[String] {
        self.active.get_or_init(|| {
            let data = match self.inner.data() {
                Some(data) => data,
                None => return Vec::new(),
            };
            let mut submitted: Vec<String> = Vec::new();
            for key in data.keys() {
                let name = match self.inner.prefix() {
                    Some(p) => match key.strip_prefix(&format!("{}-", p)) {
                        Some(rest) => rest,
                        None => continue,
                    },
                    None => key,
                };
                let stripped = PART_SUFFIX.replace(name, "").into_owned();
                if !submitted.contains(&stripped) {
                    submitted.push(stripped);
                }
            }
            self.inner
                .descriptors()
                .iter()
                .map(|d| d.name().to_string())
                .filter(|n| submitted.contains(n))
                .collect()
        })
    }

    /// Metadata for every *available* descriptor, active or not.
    pub fn field_options(&self) -> Vec<FieldOption> {
        self.inner
            .descriptors()
            .iter()
            .map(|d| FieldOption {
                name: d.name().to_string(),
                label: d.label_text(),
                widget: d.widget_hint().to_string(),
                filter: d.type_name().to_string(),
            })
            .collect()
    }

    /// The field metadata as a JSON object keyed by field name.
    pub fn options_json(&self) -> String {
        let mut map = serde_json::Map::new();
        for opt in self.field_options() {
            map.insert(
                opt.name.clone(),
                json!({
                    "label": opt.label,
                    "widget": opt.widget,
                    "filter": opt.filter,
                }),
            );
        }
        Value::Object(map).to_string()
    }

    /// The form to render: the field picker plus slots for active
    /// fields only. Built once and memoized.
    pub fn dynamic_form(&self) -> &Form {
        self.dynamic_form.get_or_init(|| {
            let mut form = Form::new(self.inner.prefix().map(str::to_string));
            let mut choices: Vec<(String, String)> = vec![(String::new(), "--------".to_string())];
            for opt in self.field_options() {
                choices.push((opt.name, opt.label));
            }
            choices.sort_by(|a, b| a.1.cmp(&b.1));
            form.register_slot(
                Slot::new(SELECT_FIELD_KEY, SlotKind::Choice(choices)).with_label("Select field"),
            );
            if self.is_bound() {
                let active = self.active_fields();
                for desc in self.inner.descriptors() {
                    if active.iter().any(|n| n == desc.name()) {
                        form.register_slot(desc.slot());
                    }
                }
            }
            form
        })
    }
}
