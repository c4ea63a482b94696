//! Fixed record layout for the key-value store
//!
//! Records live under `<entity>:<id>` keys as flat string hashes. The store
//! keeps no types, so each field's type comes from this table: identifiers
//! and counts are integers, money and percentages are floats, everything
//! else is text. Unknown entities and fields decode as text.

use std::fmt;

/// Entities of the sample data set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Entity {
    Customer,
    Order,
    Product,
}

impl Entity {
    /// Entities in identifier-resolution priority order
    pub const ALL: [Entity; 3] = [Entity::Customer, Entity::Order, Entity::Product];

    /// Key prefix (`customer` in `customer:1`)
    pub fn prefix(&self) -> &'static str {
        match self {
            Entity::Customer => "customer",
            Entity::Order => "order",
            Entity::Product => "product",
        }
    }

    /// Collection or table name holding this entity
    pub fn collection(&self) -> &'static str {
        match self {
            Entity::Customer => "customers",
            Entity::Order => "orders",
            Entity::Product => "products",
        }
    }

    /// Reference field pointing at this entity (`customer_id`)
    pub fn reference_field(&self) -> &'static str {
        match self {
            Entity::Customer => "customer_id",
            Entity::Order => "order_id",
            Entity::Product => "product_id",
        }
    }

    /// Resolves a key prefix back to an entity
    pub fn from_prefix(prefix: &str) -> Option<Entity> {
        Entity::ALL.into_iter().find(|e| e.prefix() == prefix)
    }

    /// Resolves a collection name back to an entity
    pub fn from_collection(collection: &str) -> Option<Entity> {
        Entity::ALL.into_iter().find(|e| e.collection() == collection)
    }

    /// Exact key for a record of this entity
    pub fn key(&self, id: impl fmt::Display) -> String {
        format!("{}:{}", self.prefix(), id)
    }

    /// Pattern matching every record of this entity
    pub fn wildcard(&self) -> String {
        format!("{}:*", self.prefix())
    }

    /// Field names of this entity's records, in column order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Entity::Customer => &[
                "customer_id",
                "first_name",
                "last_name",
                "email",
                "phone",
                "address",
                "city",
                "country",
                "credit_limit",
                "registration_date",
            ],
            Entity::Product => &[
                "product_id",
                "name",
                "price",
                "category",
                "stock_quantity",
                "manufacturer",
                "release_date",
                "discount",
            ],
            Entity::Order => &[
                "order_id",
                "customer_id",
                "product_id",
                "quantity",
                "order_date",
                "status",
                "total_price",
                "shipping_address",
                "payment_method",
            ],
        }
    }

    /// Declared kind of one of this entity's fields
    pub fn field_kind(&self, field: &str) -> FieldKind {
        match (self, field) {
            (Entity::Customer, "customer_id") => FieldKind::Int,
            (Entity::Customer, "credit_limit") => FieldKind::Float,

            (Entity::Product, "product_id") => FieldKind::Int,
            (Entity::Product, "price") => FieldKind::Float,
            (Entity::Product, "stock_quantity") => FieldKind::Int,
            (Entity::Product, "discount") => FieldKind::Float,

            (Entity::Order, "order_id") => FieldKind::Int,
            (Entity::Order, "customer_id") => FieldKind::Int,
            (Entity::Order, "product_id") => FieldKind::Int,
            (Entity::Order, "quantity") => FieldKind::Int,
            (Entity::Order, "total_price") => FieldKind::Float,

            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Declared kind of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

impl FieldKind {
    /// Returns the type tag shown in schemas
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Text => "str",
        }
    }

    /// Kind of a field on an arbitrary key prefix
    pub fn of(prefix: &str, field: &str) -> FieldKind {
        Entity::from_prefix(prefix)
            .map(|e| e.field_kind(field))
            .unwrap_or(FieldKind::Text)
    }
}
