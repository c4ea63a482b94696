//! Normalized schema representation
//!
//! A schema is an ordered mapping from entity name (table, collection or
//! key prefix) to an ordered list of fields with a type tag. Tags are kept
//! verbatim from the store (`INTEGER`, `text`, `float`, ...) because they are
//! only ever shown to the generator, never interpreted.

use serde::{Deserialize, Serialize};

/// A single field and its declared or inferred type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name
    pub name: String,
    /// Type tag as reported by the store
    pub type_tag: String,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }
}

/// One table, collection or key prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity name
    pub name: String,
    /// Fields in discovery order
    pub fields: Vec<SchemaField>,
}

impl EntitySchema {
    /// Returns the field with the given name
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Ordered entity → fields mapping, built fresh per request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    entities: Vec<EntitySchema>,
}

impl Schema {
    /// Creates an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity with no fields, keeping its first-seen position
    pub fn add_entity(&mut self, entity: &str) {
        if self.entity(entity).is_none() {
            self.entities.push(EntitySchema {
                name: entity.to_string(),
                fields: Vec::new(),
            });
        }
    }

    /// Adds a field to an entity, creating the entity if needed.
    ///
    /// A field already present on the entity is left untouched, so the
    /// first-seen type tag wins.
    pub fn add_field(&mut self, entity: &str, field: &str, type_tag: &str) {
        self.add_entity(entity);
        if let Some(schema) = self.entities.iter_mut().find(|e| e.name == entity) {
            if schema.field(field).is_none() {
                schema.fields.push(SchemaField::new(field, type_tag));
            }
        }
    }

    /// Builder form of [`Schema::add_field`]
    pub fn with_field(mut self, entity: &str, field: &str, type_tag: &str) -> Self {
        self.add_field(entity, field, type_tag);
        self
    }

    /// Returns the entity with the given name
    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Returns all entities in discovery order
    pub fn entities(&self) -> &[EntitySchema] {
        &self.entities
    }

    /// Returns entity names in discovery order
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Renders the schema as the text block embedded in generator prompts
    pub fn describe(&self) -> String {
        self.entities
            .iter()
            .map(|entity| {
                let columns = entity
                    .fields
                    .iter()
                    .map(|f| format!("{} ({})", f.name, f.type_tag))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Table/Collection: {}\nColumns/Fields: {}", entity.name, columns)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
