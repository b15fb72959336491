//! # Filter descriptors
//!
//! A [`FilterDescriptor`] is the atomic unit of filtering: one named
//! field, the lookups it permits, the input kind its raw value must
//! validate as, and the recipe for turning a cleaned value into a query
//! predicate. Descriptors are immutable templates, built once when a
//! filter-set definition is assembled; every bound filter set works on
//! its own clones.
//!
//! The [`FilterFactory`] maps a schema field to its default descriptor,
//! the way a hand-written declaration would have configured it, and can
//! be overridden per field.
//!
//! Example:
//! ```rust
//! use serde_json::json;
//! use sieve_query::filters::FilterDescriptor;
//! use sieve_query::lookups::LookupOp;
//! use sieve_query::memory::MemoryQuery;
//! use sieve_query::values::FilterValue;
//!
//! let desc = FilterDescriptor::number("age").lookup(LookupOp::Gt);
//! let q = MemoryQuery::new(vec![json!({"age": 34}), json!({"age": 12})]);
//! let q = desc.apply(q, &FilterValue::Number(18.0));
//! assert_eq!(q.to_vec(), vec![json!({"age": 34})]);
//! ```

use log::trace;
use strum::Display;

use crate::forms::{capfirst, Slot, SlotKind};
use crate::lookups::{Lookup, LookupOp};
use crate::query::{Predicate, Queryset};
use crate::schema::FieldDef;
use crate::values::FilterValue;

/// Which lookups a descriptor permits.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupSpec {
    /// Exactly one operator, used unconditionally.
    Fixed(Lookup),
    /// The caller chooses among an explicit subset.
    Choice(Vec<Lookup>),
    /// The caller chooses among the whole vocabulary.
    All,
}

impl LookupSpec {
    /// The operators offered to the caller, when there is a choice.
    pub fn offered(&self) -> Option<Vec<Lookup>> {
        match self {
            LookupSpec::Fixed(_) => None,
            LookupSpec::Choice(lookups) => Some(lookups.clone()),
            LookupSpec::All => Some(Lookup::all()),
        }
    }
}

/// Rendering hint for the input widget. The engine never renders;
/// the hint is surfaced through the field metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Widget {
    TextInput,
    NumberInput,
    CheckboxInput,
    Select,
    SelectMultiple,
    DateInput,
    DateTimeInput,
    TimeInput,
}

/// Configuration template for one filterable field.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    name: String,
    label: Option<String>,
    /// Resolved field path for relation-spanning filters; predicates
    /// target this instead of `name` when set.
    target: Option<String>,
    lookups: LookupSpec,
    kind: SlotKind,
    required: bool,
    related: Option<String>,
    widget: Widget,
    /// Model this descriptor is currently bound against. Set on the
    /// per-instance clone, never on the template.
    model: Option<String>,
    /// Derived descriptor a relation-spanning filter validates
    /// through, resolved at build time.
    delegate: Option<Box<FilterDescriptor>>,
}

impl FilterDescriptor {
    fn base(name: impl Into<String>, kind: SlotKind, widget: Widget) -> Self {
        Self {
            name: name.into(),
            label: None,
            target: None,
            lookups: LookupSpec::Fixed(Lookup::new(LookupOp::Exact)),
            kind,
            required: false,
            related: None,
            widget,
            model: None,
            delegate: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::base(name, SlotKind::Text, Widget::TextInput)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::base(name, SlotKind::Number, Widget::NumberInput)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::base(name, SlotKind::Boolean, Widget::CheckboxInput)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::base(name, SlotKind::Date, Widget::DateInput)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::base(name, SlotKind::DateTime, Widget::DateTimeInput)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::base(name, SlotKind::Time, Widget::TimeInput)
    }

    pub fn choice(name: impl Into<String>, choices: Vec<(String, String)>) -> Self {
        Self::base(name, SlotKind::Choice(choices), Widget::Select)
    }

    pub fn multi_choice(name: impl Into<String>, choices: Vec<(String, String)>) -> Self {
        Self::base(name, SlotKind::MultiChoice(choices), Widget::SelectMultiple)
            .lookup(LookupOp::In)
    }

    /// Several free-form values of `inner` kind, matched as a set.
    pub fn many(name: impl Into<String>, inner: SlotKind) -> Self {
        Self::base(name, SlotKind::Many(Box::new(inner)), Widget::SelectMultiple)
            .lookup(LookupOp::In)
    }

    /// A `(start, stop)` between-bounds filter over `inner` values.
    pub fn range(name: impl Into<String>, inner: SlotKind) -> Self {
        Self::base(name, SlotKind::Range(Box::new(inner)), Widget::TextInput)
            .lookup(LookupOp::Range)
    }

    /// A filter on a field reached through a relation. The input kind
    /// is taken from a descriptor derived for `target` when the
    /// filter-set definition is built.
    pub fn related(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut desc = Self::base(name, SlotKind::Text, Widget::TextInput);
        desc.target = Some(target.into());
        desc
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Permit exactly this operator.
    pub fn lookup(mut self, lookup: impl Into<Lookup>) -> Self {
        self.lookups = LookupSpec::Fixed(lookup.into());
        self
    }

    /// Let the caller choose among this subset of operators.
    pub fn lookups<I>(mut self, lookups: I) -> Self
    where
        I: IntoIterator<Item = Lookup>,
    {
        self.lookups = LookupSpec::Choice(lookups.into_iter().collect());
        self
    }

    /// Let the caller choose any operator in the vocabulary.
    pub fn all_lookups(mut self) -> Self {
        self.lookups = LookupSpec::All;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn widget(mut self, widget: Widget) -> Self {
        self.widget = widget;
        self
    }

    /// Record the related model this filter draws its values from.
    pub fn related_model(mut self, model: impl Into<String>) -> Self {
        self.related = Some(model.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_text(&self) -> String {
        self.label.clone().unwrap_or_else(|| capfirst(&self.name))
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn lookup_spec(&self) -> &LookupSpec {
        &self.lookups
    }

    pub fn input_kind(&self) -> &SlotKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn relation(&self) -> Option<&str> {
        self.related.as_deref()
    }

    pub fn widget_hint(&self) -> Widget {
        self.widget
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn delegate(&self) -> Option<&FilterDescriptor> {
        self.delegate.as_deref()
    }

    /// Descriptor-type name surfaced in UI metadata.
    pub fn type_name(&self) -> &'static str {
        if self.target.is_some() {
            return "RelatedFilter";
        }
        match &self.kind {
            SlotKind::Text => "TextFilter",
            SlotKind::Number => "NumberFilter",
            SlotKind::Boolean => "BooleanFilter",
            SlotKind::Date => "DateFilter",
            SlotKind::DateTime => "DateTimeFilter",
            SlotKind::Time => "TimeFilter",
            SlotKind::Choice(_) => {
                if self.related.is_some() {
                    "ModelChoiceFilter"
                } else {
                    "ChoiceFilter"
                }
            }
            SlotKind::MultiChoice(_) | SlotKind::Many(_) => {
                if self.related.is_some() {
                    "ModelMultiChoiceFilter"
                } else {
                    "MultiChoiceFilter"
                }
            }
            SlotKind::Range(_) => "RangeFilter",
            SlotKind::LookupChoice { .. } => "TextFilter",
        }
    }

    pub(crate) fn attach_delegate(&mut self, delegate: FilterDescriptor) {
        self.delegate = Some(Box::new(delegate));
    }

    pub(crate) fn set_lookups(&mut self, lookups: LookupSpec) {
        self.lookups = lookups;
    }

    /// The per-instance working copy, with the current model attached.
    pub(crate) fn bound_clone(&self, model: Option<&str>) -> FilterDescriptor {
        let mut clone = self.clone();
        clone.model = model.map(|m| m.to_string());
        clone
    }

    /// The validation slot for this descriptor.
    pub fn slot(&self) -> Slot {
        // Relation-spanning filters validate with the input kind of
        // the field they actually target.
        let base = self
            .delegate
            .as_ref()
            .map(|d| d.kind.clone())
            .unwrap_or_else(|| self.kind.clone());
        let kind = match self.lookups.offered() {
            Some(lookups) => SlotKind::LookupChoice {
                value: Box::new(base),
                lookups,
            },
            None => base,
        };
        Slot::new(self.name.clone(), kind)
            .with_label(self.label_text())
            .required(self.required)
    }

    fn default_lookup(&self) -> Lookup {
        match &self.lookups {
            LookupSpec::Fixed(lookup) => *lookup,
            _ => Lookup::new(LookupOp::Exact),
        }
    }

    /// Apply this filter to `qs` for an already-cleaned value.
    ///
    /// An empty value leaves the query unchanged. Negated lookups
    /// build an exclusion predicate from the positive operator.
    pub fn apply<Q: Queryset>(&self, qs: Q, value: &FilterValue) -> Q {
        if is_empty_value(value) {
            return qs;
        }
        let (lookup, operand) = match value {
            FilterValue::WithLookup(lookup, inner) => (*lookup, inner.as_ref().clone()),
            other => (self.default_lookup(), other.clone()),
        };
        // Structured values choose their natural operator.
        let op = match &operand {
            FilterValue::Range(_, _) => LookupOp::Range,
            FilterValue::Many(_) if lookup.op == LookupOp::Exact => LookupOp::In,
            _ => lookup.op,
        };
        let path = self.target.as_deref().unwrap_or(&self.name);
        let pred = Predicate::new(path, op, operand);
        trace!(
            "'{}': {} {:?} on '{}'",
            self.name,
            if lookup.negated { "exclude" } else { "filter" },
            pred.op,
            pred.path
        );
        if lookup.negated {
            qs.exclude(&pred)
        } else {
            qs.filter(&pred)
        }
    }
}

fn is_empty_value(value: &FilterValue) -> bool {
    match value {
        FilterValue::Text(s) => s.is_empty(),
        FilterValue::Many(vs) => vs.is_empty(),
        FilterValue::WithLookup(_, inner) => is_empty_value(inner),
        _ => false,
    }
}

/// Hook consulted before the default field-kind mapping.
pub type DescriptorHook = dyn Fn(&FieldDef, &str) -> Option<FilterDescriptor>;

/// Maps schema fields to their default descriptors.
#[derive(Default)]
pub struct FilterFactory {
    hook: Option<Box<DescriptorHook>>,
}

impl FilterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `hook` first for every field; a `None` return falls
    /// through to the defaults.
    pub fn with_override<F>(hook: F) -> Self
    where
        F: Fn(&FieldDef, &str) -> Option<FilterDescriptor> + 'static,
    {
        Self {
            hook: Some(Box::new(hook)),
        }
    }

    /// The default descriptor for a schema field, or `None` when the
    /// field kind has no filtering support.
    pub fn descriptor_for(&self, field: &FieldDef, name: &str) -> Option<FilterDescriptor> {
        if let Some(hook) = &self.hook {
            if let Some(desc) = hook(field, name) {
                return Some(apply_field_label(desc, field));
            }
        }
        use crate::schema::FieldKind::*;
        // Enumerated choices win over the storage kind.
        if let Some(choices) = &field.choices {
            return Some(apply_field_label(
                FilterDescriptor::choice(name, choices.clone()),
                field,
            ));
        }
        let desc = match &field.kind {
            Text | Slug | Email | Url | IpAddress => FilterDescriptor::text(name),
            Integer | Float | Decimal => FilterDescriptor::number(name),
            Boolean | NullBoolean => FilterDescriptor::boolean(name),
            Date => FilterDescriptor::date(name),
            DateTime => FilterDescriptor::datetime(name),
            Time => FilterDescriptor::time(name),
            ForeignKey(model) | OneToOne(model) => FilterDescriptor::text(name)
                .widget(Widget::Select)
                .related_model(model.clone()),
            ManyToMany(model) => {
                FilterDescriptor::many(name, SlotKind::Text).related_model(model.clone())
            }
        };
        Some(apply_field_label(desc, field))
    }
}

fn apply_field_label(desc: FilterDescriptor, field: &FieldDef) -> FilterDescriptor {
    match (&desc.label, &field.label) {
        (None, Some(label)) => desc.label(capfirst(label)),
        _ => desc,
    }
}
