//! # Combining repeated filter-set rows
//!
//! A [`FilterSetGroup`] runs N independently-configured rows of the
//! same filter-set definition against one base query and unions the
//! results. Each row reads its input under a positional prefix (`1`,
//! `2`, …), so the same field can be filtered differently per row.
//! One shared ordering directive applies to the union, and a final
//! distinctness pass collapses rows matched by more than one
//! sub-filter-set.
//!
//! The row count comes from the reserved `group-total-forms` input
//! key. With no input at all, the group holds a single unbound row so
//! an initial, empty form can still be rendered; once any input is
//! present the row count is mandatory.

use std::sync::Arc;

use log::debug;
use once_cell::unsync::OnceCell;

use crate::dynamic::DynamicFilterSet;
use crate::filterset::{ConfigError, FilterSetDef};
use crate::forms::{Form, QueryMap, DESCENDING_MARKER, ORDER_BY_KEY, ORDER_DIRECTION_KEY};
use crate::query::{Queryset, UNORDERED};

/// Reserved input key carrying the number of rows.
pub const GROUP_COUNT_KEY: &str = "group-total-forms";

/// N prefixed rows over a shared base query, unioned.
#[derive(Debug)]
pub struct FilterSetGroup<Q: Queryset> {
    rows: Vec<DynamicFilterSet<Q>>,
    data: QueryMap,
    base: Q,
    union: OnceCell<Q>,
    result: OnceCell<Q>,
}

impl<Q: Queryset> FilterSetGroup<Q> {
    /// Build the group's rows from raw input.
    ///
    /// Empty input yields exactly one unbound row. Non-empty input
    /// must carry a numeric `group-total-forms`, otherwise
    /// construction fails with [`ConfigError::MissingRowCount`].
    pub fn new(def: &Arc<FilterSetDef>, data: QueryMap, base: Q) -> Result<Self, ConfigError> {
        let mut rows = Vec::new();
        if data.is_empty() {
            rows.push(DynamicFilterSet::unbound_prefixed(def, base.clone(), "1"));
        } else {
            let count: usize = data
                .get(GROUP_COUNT_KEY)
                .and_then(|v| v.parse().ok())
                .ok_or(ConfigError::MissingRowCount)?;
            for i in 1..=count.max(1) {
                rows.push(DynamicFilterSet::bind_prefixed(
                    def,
                    data.clone(),
                    base.clone(),
                    i.to_string(),
                ));
            }
        }
        Ok(Self {
            rows,
            data,
            base,
            union: OnceCell::new(),
            result: OnceCell::new(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[DynamicFilterSet<Q>] {
        &self.rows
    }

    /// The dynamic form of each row, for rendering.
    pub fn forms(&self) -> impl Iterator<Item = &Form> {
        self.rows.iter().map(|row| row.dynamic_form())
    }

    /// Field names available for the shared ordering directive.
    pub fn field_names(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.inner().def().field_names())
            .unwrap_or_default()
    }

    /// The union of every row's result, with the shared ordering
    /// applied. Built once and memoized.
    pub fn base_qs(&self) -> &Q {
        self.union.get_or_init(|| {
            let mut qs = self.base.none();
            for row in &self.rows {
                qs = qs.union(row.qs());
            }
            if let Some(field) = self.data.get(ORDER_BY_KEY).filter(|v| !v.is_empty()) {
                let mut direction = self.data.get(ORDER_DIRECTION_KEY).unwrap_or("");
                if direction != DESCENDING_MARKER {
                    direction = "";
                }
                let expr = if self.field_names().iter().any(|n| n == field) {
                    format!("{}{}", direction, field)
                } else {
                    // Unknown ordering fields are not an error; the
                    // order is simply unspecified.
                    debug!("unknown ordering field '{}', order unspecified", field);
                    UNORDERED.to_string()
                };
                qs = qs.order_by(&expr);
            }
            qs
        })
    }

    /// The final result: the union with duplicates collapsed.
    pub fn qs(&self) -> &Q {
        self.result.get_or_init(|| self.base_qs().distinct())
    }
}
