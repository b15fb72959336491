//! # Runtime model schemas
//!
//! A [`Schema`] is a registry of named models, each with an ordered
//! list of typed fields. Field names can reach through relations with
//! the `__` separator, so `author__name` on an `article` model names
//! the `name` field of the related `author` model. Resolution happens
//! once, when a filter-set definition is built; bound filter sets never
//! touch the schema again.
//!
//! Example:
//! ```rust
//! use sieve_query::schema::{FieldDef, FieldKind, ModelSchema, Schema};
//!
//! let mut schema = Schema::new();
//! schema.add_model(ModelSchema::new(
//!     "author",
//!     vec![FieldDef::new("name", FieldKind::Text)],
//! ));
//! schema.add_model(ModelSchema::new(
//!     "article",
//!     vec![
//!         FieldDef::new("title", FieldKind::Text),
//!         FieldDef::new("author", FieldKind::ForeignKey("author".into())),
//!     ],
//! ));
//!
//! let field = schema.resolve("article", "author__name").unwrap();
//! assert_eq!(field.kind, FieldKind::Text);
//! assert!(schema.resolve("article", "author__missing").is_none());
//! ```

/// Separator between path segments that traverse a relation.
pub const RELATION_SEP: &str = "__";

/// The type of a model field, as far as filtering is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Slug,
    Email,
    Url,
    IpAddress,
    Integer,
    Float,
    Decimal,
    Boolean,
    NullBoolean,
    Date,
    DateTime,
    Time,
    /// To-one relation onto the named model.
    ForeignKey(String),
    /// To-one relation with a unique constraint.
    OneToOne(String),
    /// To-many relation onto the named model.
    ManyToMany(String),
}

impl FieldKind {
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            FieldKind::ForeignKey(_) | FieldKind::OneToOne(_) | FieldKind::ManyToMany(_)
        )
    }

    /// The related model's name, for relation kinds.
    pub fn related_model(&self) -> Option<&str> {
        match self {
            FieldKind::ForeignKey(m) | FieldKind::OneToOne(m) | FieldKind::ManyToMany(m) => {
                Some(m.as_str())
            }
            _ => None,
        }
    }
}

/// One named, typed field on a model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub label: Option<String>,
    /// Enumerated `(value, label)` choices, when the field is limited
    /// to a fixed set.
    pub choices: Option<Vec<(String, String)>>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            choices: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_choices<I, V, L>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        );
        self
    }
}

/// A named model: an ordered set of fields.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Registry of models, and the entry point for path resolution.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: Vec<ModelSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: ModelSchema) -> &mut Self {
        self.models.push(model);
        self
    }

    pub fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Resolve a possibly relation-spanning path against a model.
    ///
    /// Every segment but the last must name a relation field; traversal
    /// continues against the related model. Returns `None` when any
    /// segment is absent, an intermediate segment is not a relation, or
    /// a related model is not registered.
    pub fn resolve(&self, model: &str, path: &str) -> Option<&FieldDef> {
        let mut current = self.model(model)?;
        let segments: Vec<&str> = path.split(RELATION_SEP).collect();
        let (last, init) = segments.split_last()?;
        for segment in init {
            let field = current.field(segment)?;
            let related = field.kind.related_model()?;
            current = self.model(related)?;
        }
        current.field(last)
    }
}
