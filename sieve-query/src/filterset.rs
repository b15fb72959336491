//! # Filter-set definitions and bound filter sets
//!
//! A [`FilterSetDef`] is assembled once, in two phases: explicit
//! [`declare`](FilterSetBuilder::declare) calls register descriptors in
//! call order, then [`build`](FilterSetBuilder::build) enumerates the
//! configured model's schema, generates default descriptors through the
//! [`FilterFactory`](crate::filters::FilterFactory), merges the two
//! sets (declarations override by name) and verifies that every
//! allow-listed field resolved. The result is immutable and shared
//! between requests behind an [`Arc`].
//!
//! A [`FilterSet`] is the request-scoped working instance: it owns a
//! clone of every descriptor, the raw input and a base query, and
//! lazily produces a validation [`Form`] and the composed result query.
//! A field whose input fails validation contributes nothing; the rest
//! of the input still filters, so partially-invalid input yields a
//! best-effort result.
//!
//! Example:
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use sieve_query::filterset::{FilterSet, FilterSetBuilder, OrderBy};
//! use sieve_query::forms::QueryMap;
//! use sieve_query::memory::MemoryQuery;
//! use sieve_query::schema::{FieldDef, FieldKind, ModelSchema, Schema};
//!
//! let mut schema = Schema::new();
//! schema.add_model(ModelSchema::new(
//!     "person",
//!     vec![
//!         FieldDef::new("name", FieldKind::Text),
//!         FieldDef::new("age", FieldKind::Integer),
//!     ],
//! ));
//!
//! let def = Arc::new(
//!     FilterSetBuilder::for_model("person")
//!         .order_by(OrderBy::AllFields)
//!         .build(&schema)
//!         .unwrap(),
//! );
//!
//! let rows = MemoryQuery::new(vec![
//!     json!({"name": "alice", "age": 34}),
//!     json!({"name": "bob", "age": 12}),
//! ]);
//! let fs = FilterSet::bound(&def, QueryMap::from_pairs([("name", "alice")]), rows);
//! assert!(fs.is_bound());
//! assert_eq!(fs.qs().to_vec(), vec![json!({"name": "alice", "age": 34})]);
//! ```

use std::sync::Arc;

use log::debug;
use once_cell::unsync::OnceCell;
use thiserror::Error;

use crate::filters::{FilterDescriptor, FilterFactory};
use crate::forms::{capfirst, Form, QueryMap, Slot, SlotKind, ORDER_BY_KEY};
use crate::query::Queryset;
use crate::schema::{Schema, RELATION_SEP};
use crate::values::FilterValue;

/// A filter-set definition could not be built. Always fatal; nothing
/// here is recovered at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("model '{0}' is not registered in the schema")]
    UnknownModel(String),
    #[error("field '{field}' is not defined on model '{model}'")]
    UnknownField { field: String, model: String },
    #[error("cannot resolve target '{target}' for filter '{field}'")]
    UnresolvedTarget { field: String, target: String },
    #[error("row count missing from group input")]
    MissingRowCount,
}

/// Whether, and by which fields, a bound set may order its result.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OrderBy {
    #[default]
    Disabled,
    /// Offer every filterable field.
    AllFields,
    /// Offer exactly these fields.
    Fields(Vec<String>),
}

/// Immutable configuration shared by every instance of a definition.
#[derive(Debug, Clone, Default)]
pub struct FilterSetOptions {
    model: Option<String>,
    fields: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    order_by: OrderBy,
}

impl FilterSetOptions {
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn excluded(&self) -> Option<&[String]> {
        self.exclude.as_deref()
    }

    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }
}

/// Two-phase builder for a [`FilterSetDef`].
pub struct FilterSetBuilder {
    options: FilterSetOptions,
    factory: FilterFactory,
    declared: Vec<FilterDescriptor>,
}

impl Default for FilterSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterSetBuilder {
    /// A builder with no model; only declared descriptors apply.
    pub fn new() -> Self {
        Self {
            options: FilterSetOptions::default(),
            factory: FilterFactory::new(),
            declared: Vec::new(),
        }
    }

    /// A builder that auto-generates descriptors from `model`'s schema.
    pub fn for_model(model: impl Into<String>) -> Self {
        let mut builder = Self::new();
        builder.options.model = Some(model.into());
        builder
    }

    /// Restrict schema-derived descriptors to exactly these fields.
    /// Any name that fails to resolve fails the build.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Leave these schema fields out of the auto-generated set.
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.options.order_by = order_by;
        self
    }

    /// Replace the descriptor factory, for per-field-type overrides.
    pub fn factory(mut self, factory: FilterFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Seed this builder with the direct declarations of an existing
    /// definition. Later `declare` calls override by name.
    pub fn inherit(mut self, parent: &FilterSetDef) -> Self {
        for desc in &parent.declared {
            self = self.declare(desc.clone());
        }
        self
    }

    /// Register an explicitly declared descriptor. Call order is
    /// declaration order; redeclaring a name replaces the earlier
    /// descriptor in place.
    pub fn declare(mut self, descriptor: FilterDescriptor) -> Self {
        match self
            .declared
            .iter()
            .position(|d| d.name() == descriptor.name())
        {
            Some(pos) => self.declared[pos] = descriptor,
            None => self.declared.push(descriptor),
        }
        self
    }

    /// Run phase two: schema enumeration, factory defaults, merge and
    /// verification.
    pub fn build(self, schema: &Schema) -> Result<FilterSetDef, ConfigError> {
        let FilterSetBuilder {
            options,
            factory,
            declared,
        } = self;

        let mut descriptors: Vec<FilterDescriptor> = Vec::new();
        if let Some(model_name) = &options.model {
            let model = schema
                .model(model_name)
                .ok_or_else(|| ConfigError::UnknownModel(model_name.clone()))?;
            let names: Vec<String> = match &options.fields {
                Some(fields) => fields.clone(),
                None => model.field_names().map(str::to_string).collect(),
            };
            for name in names {
                if let Some(excluded) = &options.exclude {
                    if excluded.contains(&name) {
                        continue;
                    }
                }
                if let Some(field) = schema.resolve(model_name, &name) {
                    if let Some(desc) = factory.descriptor_for(field, &name) {
                        descriptors.push(desc);
                    }
                }
            }
        }

        // Declarations override schema-derived descriptors by name and
        // append after them otherwise.
        for desc in &declared {
            match descriptors.iter().position(|d| d.name() == desc.name()) {
                Some(pos) => descriptors[pos] = desc.clone(),
                None => descriptors.push(desc.clone()),
            }
        }

        if let Some(fields) = &options.fields {
            for name in fields {
                if !descriptors.iter().any(|d| d.name() == name.as_str()) {
                    return Err(ConfigError::UnknownField {
                        field: name.clone(),
                        model: options.model.clone().unwrap_or_default(),
                    });
                }
            }
        }

        // Resolve relation-spanning declarations so they can validate
        // with the input kind of the field they actually target.
        for desc in &mut descriptors {
            let target = match desc.target() {
                Some(target) => target.to_string(),
                None => continue,
            };
            let leaf = target
                .rsplit(RELATION_SEP)
                .next()
                .unwrap_or(target.as_str());
            let delegate = options
                .model
                .as_deref()
                .and_then(|model| schema.resolve(model, &target))
                .and_then(|field| factory.descriptor_for(field, leaf));
            match delegate {
                Some(mut delegate) => {
                    delegate.set_lookups(desc.lookup_spec().clone());
                    desc.attach_delegate(delegate);
                }
                None => {
                    return Err(ConfigError::UnresolvedTarget {
                        field: desc.name().to_string(),
                        target,
                    })
                }
            }
        }

        Ok(FilterSetDef {
            options,
            descriptors,
            declared,
        })
    }
}

/// The finished, immutable descriptor template for one filter-set
/// type. Lives for the process's duration; bound instances clone from
/// it per request.
#[derive(Debug)]
pub struct FilterSetDef {
    options: FilterSetOptions,
    descriptors: Vec<FilterDescriptor>,
    declared: Vec<FilterDescriptor>,
}

impl FilterSetDef {
    pub fn options(&self) -> &FilterSetOptions {
        &self.options
    }

    pub fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    pub fn field_names(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    fn ordering_choices(&self) -> Vec<(String, String)> {
        let names: Vec<&str> = match &self.options.order_by {
            OrderBy::Disabled => return Vec::new(),
            OrderBy::AllFields => self.descriptors.iter().map(|d| d.name()).collect(),
            OrderBy::Fields(fields) => fields.iter().map(String::as_str).collect(),
        };
        names
            .into_iter()
            .map(|n| (n.to_string(), capfirst(n)))
            .collect()
    }
}

/// A request-scoped filter-set instance.
///
/// Holds owned descriptor clones, the raw input (if bound) and the
/// base query. The validation form and the result query are built
/// lazily, once, and re-reads return the memoized value.
#[derive(Debug)]
pub struct FilterSet<Q: Queryset> {
    def: Arc<FilterSetDef>,
    descriptors: Vec<FilterDescriptor>,
    data: Option<QueryMap>,
    base: Q,
    prefix: Option<String>,
    form: OnceCell<Form>,
    result: OnceCell<Q>,
}

impl<Q: Queryset> FilterSet<Q> {
    fn new(def: Arc<FilterSetDef>, data: Option<QueryMap>, base: Q, prefix: Option<String>) -> Self {
        let model = def.options.model.as_deref();
        let descriptors = def
            .descriptors
            .iter()
            .map(|d| d.bound_clone(model))
            .collect();
        Self {
            def,
            descriptors,
            data,
            base,
            prefix,
            form: OnceCell::new(),
            result: OnceCell::new(),
        }
    }

    /// Bind raw request input against a base query.
    pub fn bound(def: &Arc<FilterSetDef>, data: QueryMap, base: Q) -> Self {
        Self::new(Arc::clone(def), Some(data), base, None)
    }

    /// Bind with an input-key prefix, for repeated-row naming.
    pub fn bound_prefixed(
        def: &Arc<FilterSetDef>,
        data: QueryMap,
        base: Q,
        prefix: impl Into<String>,
    ) -> Self {
        Self::new(Arc::clone(def), Some(data), base, Some(prefix.into()))
    }

    /// An instance with no input: every filter is a no-op.
    pub fn unbound(def: &Arc<FilterSetDef>, base: Q) -> Self {
        Self::new(Arc::clone(def), None, base, None)
    }

    pub fn unbound_prefixed(
        def: &Arc<FilterSetDef>,
        base: Q,
        prefix: impl Into<String>,
    ) -> Self {
        Self::new(Arc::clone(def), None, base, Some(prefix.into()))
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn def(&self) -> &Arc<FilterSetDef> {
        &self.def
    }

    pub fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    pub fn data(&self) -> Option<&QueryMap> {
        self.data.as_ref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn base(&self) -> &Q {
        &self.base
    }

    /// The validation form: one slot per descriptor, plus an ordering
    /// slot when ordering is enabled. Built once and memoized.
    pub fn form(&self) -> &Form {
        self.form.get_or_init(|| {
            let mut form = Form::new(self.prefix.clone());
            for desc in &self.descriptors {
                form.register_slot(desc.slot());
            }
            let choices = self.def.ordering_choices();
            if !choices.is_empty() {
                form.register_slot(
                    Slot::new(ORDER_BY_KEY, SlotKind::Choice(choices)).with_label("Ordering"),
                );
            }
            form
        })
    }

    /// The composed result query. Built once and memoized; re-reads
    /// are side-effect-free.
    pub fn qs(&self) -> &Q {
        self.result.get_or_init(|| self.build_query())
    }

    fn build_query(&self) -> Q {
        let empty = QueryMap::new();
        let data = self.data.as_ref().unwrap_or(&empty);
        let form = self.form();
        let mut qs = self.base.all();
        for desc in &self.descriptors {
            match form.clean(desc.name(), data) {
                Ok(Some(value)) => qs = desc.apply(qs, &value),
                Ok(None) => {}
                Err(e) => {
                    debug!("skipping filter '{}': {}", desc.name(), e);
                }
            }
        }
        if self.def.options.order_by != OrderBy::Disabled {
            match form.clean(ORDER_BY_KEY, data) {
                Ok(Some(FilterValue::Text(field))) => qs = qs.order_by(&field),
                Ok(_) => {}
                Err(e) => {
                    debug!("leaving result unordered: {}", e);
                }
            }
        }
        qs
    }
}
