#![cfg(test)]

use sieve_query::schema::{FieldDef, FieldKind, ModelSchema, Schema};

fn library() -> Schema {
    let mut schema = Schema::new();
    schema.add_model(ModelSchema::new(
        "author",
        vec![
            FieldDef::new("name", FieldKind::Text),
            FieldDef::new("born", FieldKind::Date),
            FieldDef::new("publisher", FieldKind::ForeignKey("publisher".into())),
        ],
    ));
    schema.add_model(ModelSchema::new(
        "publisher",
        vec![FieldDef::new("city", FieldKind::Text)],
    ));
    schema.add_model(ModelSchema::new(
        "article",
        vec![
            FieldDef::new("title", FieldKind::Text),
            FieldDef::new("author", FieldKind::ForeignKey("author".into())),
            FieldDef::new("tags", FieldKind::ManyToMany("tag".into())),
        ],
    ));
    schema.add_model(ModelSchema::new(
        "tag",
        vec![FieldDef::new("word", FieldKind::Text)],
    ));
    schema
}

#[test]
fn direct_fields_resolve() {
    let schema = library();
    assert_eq!(
        schema.resolve("article", "title").map(|f| &f.kind),
        Some(&FieldKind::Text)
    );
    assert_eq!(
        schema.resolve("author", "born").map(|f| &f.kind),
        Some(&FieldKind::Date)
    );
}

#[test]
fn relation_paths_traverse() {
    let schema = library();
    let field = schema.resolve("article", "author__name").unwrap();
    assert_eq!(field.kind, FieldKind::Text);
    // Two hops.
    let field = schema.resolve("article", "author__publisher__city").unwrap();
    assert_eq!(field.kind, FieldKind::Text);
    // To-many relations traverse too.
    let field = schema.resolve("article", "tags__word").unwrap();
    assert_eq!(field.kind, FieldKind::Text);
}

#[test]
fn missing_segments_resolve_to_none() {
    let schema = library();
    assert!(schema.resolve("article", "missing").is_none());
    assert!(schema.resolve("article", "author__missing").is_none());
    assert!(schema.resolve("article", "missing__name").is_none());
    assert!(schema.resolve("nope", "title").is_none());
}

#[test]
fn non_relation_intermediates_resolve_to_none() {
    let schema = library();
    assert!(schema.resolve("article", "title__name").is_none());
}

#[test]
fn relation_kinds() {
    assert!(FieldKind::ForeignKey("x".into()).is_relation());
    assert!(FieldKind::ManyToMany("x".into()).is_relation());
    assert!(!FieldKind::Integer.is_relation());
    assert_eq!(
        FieldKind::OneToOne("profile".into()).related_model(),
        Some("profile")
    );
    assert_eq!(FieldKind::Text.related_model(), None);
}

#[test]
fn model_field_order_is_declaration_order() {
    let schema = library();
    let names: Vec<&str> = schema.model("author").unwrap().field_names().collect();
    assert_eq!(names, vec!["name", "born", "publisher"]);
}
