//! State schemas: declared fields and their default values.
//!
//! A schema is the single source of truth for the shape of a component's
//! state. It is used both to compute the initial payload of a new envelope
//! and to hydrate a persisted payload back into a reducer-ready record.

use std::fmt;
use std::sync::Arc;

use crate::value::{StateMap, Value};

/// A zero-argument computation producing a fresh default value.
pub type ComputedDefault = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default value policy for a field.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value, cloned into every build.
    Static(Value),
    /// A computation invoked anew for every build.
    Computed(ComputedDefault),
}

impl FieldDefault {
    /// Produce an owned default value.
    ///
    /// Every call returns an independent value; nothing is shared between
    /// two builds.
    pub fn produce(&self) -> Value {
        match self {
            FieldDefault::Static(value) => value.clone(),
            FieldDefault::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Static(value) => f.debug_tuple("Static").field(value).finish(),
            FieldDefault::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A named field with its default.
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    default: FieldDefault,
}

impl Field {
    pub fn new(name: impl Into<String>, default: FieldDefault) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> Value {
        self.default.produce()
    }
}

/// Ordered set of uniquely named fields.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Start declaring a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Add a field. Redeclaring a name replaces the earlier field in place.
    pub fn add_field(&mut self, name: impl Into<String>, default: FieldDefault) {
        let field = Field::new(name, default);
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Iterate over fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A fresh payload with every field set to its default.
    pub fn defaults(&self) -> StateMap {
        self.build(None)
    }

    /// Build a payload from raw input.
    ///
    /// For every declared field, a present non-null value in `raw` wins;
    /// otherwise the field's default is used. Keys the schema doesn't
    /// declare are dropped. Never fails.
    pub fn build(&self, raw: Option<&StateMap>) -> StateMap {
        self.fields
            .iter()
            .map(|field| {
                let value = raw
                    .and_then(|raw| raw.get(&field.name))
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| field.default.produce());
                (field.name.clone(), value)
            })
            .collect()
    }

    /// Build a payload from an arbitrary value.
    ///
    /// Anything other than a map is treated as empty input.
    pub fn build_value(&self, raw: &Value) -> StateMap {
        self.build(raw.as_map())
    }
}

/// Fluent declaration of a schema.
///
/// ```rust
/// use reducible_state::{Schema, Value};
///
/// let schema = Schema::builder()
///     .field("query", "")
///     .computed("results", || Value::from(vec!["Adapter", "Component"]))
///     .build();
///
/// assert_eq!(schema.field_names(), vec!["query", "results"]);
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declare a field with a static default.
    pub fn field(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.schema
            .add_field(name, FieldDefault::Static(default.into()));
        self
    }

    /// Declare a field whose default is computed on every build.
    pub fn computed<F>(mut self, name: impl Into<String>, default: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.schema
            .add_field(name, FieldDefault::Computed(Arc::new(default)));
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    fn form_schema() -> Schema {
        Schema::builder()
            .field("name", "")
            .field("loading", false)
            .computed("errors", Value::map)
            .build()
    }

    #[test]
    fn defaults_cover_every_field() {
        let defaults = form_schema().defaults();
        assert_eq!(
            defaults,
            btree! {
                "name".to_string() => Value::from(""),
                "loading".to_string() => Value::from(false),
                "errors".to_string() => Value::map(),
            }
        );
    }

    #[test]
    fn computed_defaults_are_not_aliased() {
        let schema = Schema::builder()
            .computed("items", Value::array)
            .field("tags", Value::array())
            .build();

        let mut first = schema.defaults();
        let second = schema.defaults();

        if let Some(Value::Array(items)) = first.get_mut("items") {
            items.push(Value::from("mutated"));
        }
        if let Some(Value::Array(tags)) = first.get_mut("tags") {
            tags.push(Value::from("mutated"));
        }

        assert_eq!(second.get("items"), Some(&Value::array()));
        assert_eq!(second.get("tags"), Some(&Value::array()));
        assert_eq!(schema.defaults().get("items"), Some(&Value::array()));
    }

    #[test]
    fn computed_default_invoked_per_build() {
        use std::sync::atomic::{AtomicI64, Ordering};

        let counter = Arc::new(AtomicI64::new(0));
        let c = counter.clone();
        let schema = Schema::builder()
            .computed("seq", move || Value::from(c.fetch_add(1, Ordering::SeqCst)))
            .build();

        assert_eq!(schema.defaults().get("seq"), Some(&Value::from(0i64)));
        assert_eq!(schema.defaults().get("seq"), Some(&Value::from(1i64)));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn build_prefers_present_non_null_values() {
        let raw = btree! {
            "name".to_string() => Value::from("Alice"),
            "loading".to_string() => Value::Null,
        };

        let built = form_schema().build(Some(&raw));
        assert_eq!(built.get("name"), Some(&Value::from("Alice")));
        assert_eq!(built.get("loading"), Some(&Value::from(false)));
        assert_eq!(built.get("errors"), Some(&Value::map()));
    }

    #[test]
    fn build_drops_unknown_keys() {
        let raw = btree! {
            "name".to_string() => Value::from("Bob"),
            "legacy_flag".to_string() => Value::from(true),
        };

        let built = form_schema().build(Some(&raw));
        assert!(!built.contains_key("legacy_flag"));
        assert_eq!(built.len(), 3);
    }

    #[test]
    fn build_value_is_total() {
        let schema = form_schema();
        for raw in [
            Value::Null,
            Value::from(12),
            Value::from("junk"),
            Value::from(vec![1, 2, 3]),
        ] {
            assert_eq!(schema.build_value(&raw), schema.defaults());
        }
    }

    #[test]
    fn redeclared_field_replaces_in_place() {
        let schema = Schema::builder()
            .field("a", 1)
            .field("b", 2)
            .field("a", 3)
            .build();

        assert_eq!(schema.field_names(), vec!["a", "b"]);
        assert_eq!(schema.defaults().get("a"), Some(&Value::from(3)));
    }
}
