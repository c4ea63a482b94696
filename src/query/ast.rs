//! Structured query representation
//!
//! One variant per store family. The key-value form is the only one with
//! typed filter slots: it is the form the enrichment layer rewrites and the
//! key-value executor evaluates.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::schema::Entity;

/// A parsed, executable query
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredQuery {
    Relational(RelationalQuery),
    Document(DocumentQuery),
    KeyValue(KeyValueQuery),
}

impl StructuredQuery {
    /// Text of the query as it is submitted to the store
    pub fn text(&self) -> String {
        match self {
            StructuredQuery::Relational(q) => q.statement.clone(),
            StructuredQuery::Document(q) => q.to_json().to_string(),
            StructuredQuery::KeyValue(q) => q.to_json().to_string(),
        }
    }
}

/// One terminated SQL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalQuery {
    pub statement: String,
}

impl RelationalQuery {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
        }
    }
}

/// A document-store query
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentQuery {
    /// Aggregation pipeline; without a collection it runs against the root
    Pipeline {
        collection: Option<String>,
        stages: Vec<Value>,
    },
    /// Plain filter on one collection
    Find {
        collection: String,
        filter: Map<String, Value>,
    },
}

impl DocumentQuery {
    /// Filter query with an empty filter
    pub fn find_all(collection: impl Into<String>) -> Self {
        DocumentQuery::Find {
            collection: collection.into(),
            filter: Map::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DocumentQuery::Pipeline {
                collection: Some(collection),
                stages,
            } => json!({ "collection": collection, "pipeline": stages }),
            DocumentQuery::Pipeline {
                collection: None,
                stages,
            } => Value::Array(stages.clone()),
            DocumentQuery::Find { collection, filter } => {
                json!({ "collection": collection, "filter": filter })
            }
        }
    }
}

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Lt,
    Eq,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Gt => "gt",
            Comparator::Lt => "lt",
            Comparator::Eq => "eq",
        }
    }

    /// Mongo-style operator name
    pub fn operator(&self) -> &'static str {
        match self {
            Comparator::Gt => "$gt",
            Comparator::Lt => "$lt",
            Comparator::Eq => "$eq",
        }
    }

    /// Parses an operator key; accepts `gt`, `$gt`, `after`, ...
    pub fn from_key(key: &str) -> Option<Comparator> {
        match key.trim_start_matches('$').to_ascii_lowercase().as_str() {
            "gt" | "after" | "greater_than" => Some(Comparator::Gt),
            "lt" | "before" | "less_than" => Some(Comparator::Lt),
            "eq" | "equals" | "is" => Some(Comparator::Eq),
            _ => None,
        }
    }
}

/// Operand of a filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Date(NaiveDate),
    /// A value that could not be coerced to the slot's type
    Text(String),
}

impl FilterValue {
    /// Numeric operand from free text; non-numeric text is kept as-is
    pub fn number_from_str(raw: &str) -> FilterValue {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => FilterValue::Number(n),
            _ => FilterValue::Text(raw.to_string()),
        }
    }

    /// Date operand from `YYYY-MM-DD`; anything else is kept as text
    pub fn date_from_str(raw: &str) -> FilterValue {
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(d) => FilterValue::Date(d),
            Err(_) => FilterValue::Text(raw.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Number(n) => number_json(*n),
            FilterValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FilterValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Renders integral floats as JSON integers
fn number_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

/// A comparator and its operand
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub comparator: Comparator,
    pub value: FilterValue,
}

impl Comparison {
    pub fn new(comparator: Comparator, value: FilterValue) -> Self {
        Self { comparator, value }
    }

    pub fn gt(n: f64) -> Self {
        Self::new(Comparator::Gt, FilterValue::Number(n))
    }

    pub fn lt(n: f64) -> Self {
        Self::new(Comparator::Lt, FilterValue::Number(n))
    }

    pub fn eq(n: f64) -> Self {
        Self::new(Comparator::Eq, FilterValue::Number(n))
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(self.comparator.as_str().to_string(), self.value.to_json());
        Value::Object(out)
    }
}

/// The closed set of named filter slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterName {
    Price,
    Discount,
    Stock,
    CreditLimit,
    ReleaseDate,
    OrderDate,
    Year,
    Category,
    Manufacturer,
    City,
}

impl FilterName {
    pub const ALL: [FilterName; 10] = [
        FilterName::Price,
        FilterName::Discount,
        FilterName::Stock,
        FilterName::CreditLimit,
        FilterName::ReleaseDate,
        FilterName::OrderDate,
        FilterName::Year,
        FilterName::Category,
        FilterName::Manufacturer,
        FilterName::City,
    ];

    /// Canonical key in the JSON query form
    pub fn key(&self) -> &'static str {
        match self {
            FilterName::Price => "price_condition",
            FilterName::Discount => "discount_condition",
            FilterName::Stock => "stock_condition",
            FilterName::CreditLimit => "credit_limit_condition",
            FilterName::ReleaseDate => "release_date_condition",
            FilterName::OrderDate => "order_date_condition",
            FilterName::Year => "year",
            FilterName::Category => "category",
            FilterName::Manufacturer => "manufacturer",
            FilterName::City => "city",
        }
    }

    /// Resolves a canonical key or one of its aliases
    pub fn from_key(key: &str) -> Option<FilterName> {
        let name = match key.to_ascii_lowercase().as_str() {
            "price_condition" | "price" => FilterName::Price,
            "discount_condition" | "discount" => FilterName::Discount,
            "stock_condition" | "stock" | "stock_quantity" | "stock_quantity_condition" => {
                FilterName::Stock
            }
            "credit_limit_condition" | "credit_limit" => FilterName::CreditLimit,
            "release_date_condition" | "release_date" => FilterName::ReleaseDate,
            "order_date_condition" | "order_date" => FilterName::OrderDate,
            "year" | "year_condition" => FilterName::Year,
            "category" => FilterName::Category,
            "manufacturer" => FilterName::Manufacturer,
            "city" => FilterName::City,
            _ => return None,
        };
        Some(name)
    }

    /// Returns true for the closed-vocabulary slots
    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            FilterName::Category | FilterName::Manufacturer | FilterName::City
        )
    }

    /// Returns true for the date-valued comparison slots
    pub fn is_date(&self) -> bool {
        matches!(self, FilterName::ReleaseDate | FilterName::OrderDate)
    }

    /// Entity and field this slot designates in a document collection
    pub fn document_field(&self) -> Option<(Entity, &'static str)> {
        match self {
            FilterName::Price => Some((Entity::Product, "price")),
            FilterName::Discount => Some((Entity::Product, "discount")),
            FilterName::Stock => Some((Entity::Product, "stock_quantity")),
            FilterName::CreditLimit => Some((Entity::Customer, "credit_limit")),
            FilterName::ReleaseDate => Some((Entity::Product, "release_date")),
            FilterName::OrderDate => Some((Entity::Order, "order_date")),
            FilterName::Category => Some((Entity::Product, "category")),
            FilterName::Manufacturer => Some((Entity::Product, "manufacturer")),
            FilterName::City => Some((Entity::Customer, "city")),
            FilterName::Year => None,
        }
    }
}

/// Content of a filled slot
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    Compare(Comparison),
    /// Categorical value, compared case-insensitively
    Match(String),
}

impl FilterClause {
    pub fn to_json(&self) -> Value {
        match self {
            FilterClause::Compare(c) => c.to_json(),
            FilterClause::Match(s) => Value::String(s.clone()),
        }
    }
}

/// Named optional filter slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub price: Option<Comparison>,
    pub discount: Option<Comparison>,
    pub stock: Option<Comparison>,
    pub credit_limit: Option<Comparison>,
    pub release_date: Option<Comparison>,
    pub order_date: Option<Comparison>,
    pub year: Option<Comparison>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub city: Option<String>,
}

impl FilterSet {
    fn comparison_slot(&mut self, name: FilterName) -> Option<&mut Option<Comparison>> {
        match name {
            FilterName::Price => Some(&mut self.price),
            FilterName::Discount => Some(&mut self.discount),
            FilterName::Stock => Some(&mut self.stock),
            FilterName::CreditLimit => Some(&mut self.credit_limit),
            FilterName::ReleaseDate => Some(&mut self.release_date),
            FilterName::OrderDate => Some(&mut self.order_date),
            FilterName::Year => Some(&mut self.year),
            _ => None,
        }
    }

    fn match_slot(&mut self, name: FilterName) -> Option<&mut Option<String>> {
        match name {
            FilterName::Category => Some(&mut self.category),
            FilterName::Manufacturer => Some(&mut self.manufacturer),
            FilterName::City => Some(&mut self.city),
            _ => None,
        }
    }

    /// Fills a slot only if it is empty. Returns true if the clause was set.
    ///
    /// A clause of the wrong shape for the slot is ignored.
    pub fn set_if_absent(&mut self, name: FilterName, clause: FilterClause) -> bool {
        match clause {
            FilterClause::Compare(c) => match self.comparison_slot(name) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(c);
                    true
                }
                _ => false,
            },
            FilterClause::Match(s) => match self.match_slot(name) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(s);
                    true
                }
                _ => false,
            },
        }
    }

    /// Returns the filled slot for `name`
    pub fn get(&self, name: FilterName) -> Option<FilterClause> {
        let compare = |c: &Option<Comparison>| c.clone().map(FilterClause::Compare);
        let matching = |s: &Option<String>| s.clone().map(FilterClause::Match);
        match name {
            FilterName::Price => compare(&self.price),
            FilterName::Discount => compare(&self.discount),
            FilterName::Stock => compare(&self.stock),
            FilterName::CreditLimit => compare(&self.credit_limit),
            FilterName::ReleaseDate => compare(&self.release_date),
            FilterName::OrderDate => compare(&self.order_date),
            FilterName::Year => compare(&self.year),
            FilterName::Category => matching(&self.category),
            FilterName::Manufacturer => matching(&self.manufacturer),
            FilterName::City => matching(&self.city),
        }
    }

    /// Filled slots in canonical order
    pub fn clauses(&self) -> Vec<(FilterName, FilterClause)> {
        FilterName::ALL
            .into_iter()
            .filter_map(|name| self.get(name).map(|clause| (name, clause)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses().is_empty()
    }
}

/// A generator-supplied clause on an arbitrary record field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub comparison: Comparison,
}

/// Key-value query: a key pattern plus filters evaluated application-side
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueQuery {
    /// Glob pattern or exact key; never empty
    pub key_pattern: String,
    pub filters: FilterSet,
    pub field_conditions: Vec<FieldCondition>,
    /// Drop rows whose counterparts cannot be resolved
    pub require_joined: bool,
}

impl KeyValueQuery {
    pub fn new(key_pattern: impl Into<String>) -> Self {
        Self {
            key_pattern: key_pattern.into(),
            filters: FilterSet::default(),
            field_conditions: Vec::new(),
            require_joined: false,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("key".to_string(), Value::String(self.key_pattern.clone()));
        for (name, clause) in self.filters.clauses() {
            out.insert(name.key().to_string(), clause.to_json());
        }
        for condition in &self.field_conditions {
            let value = match condition.comparison.comparator {
                Comparator::Eq => condition.comparison.value.to_json(),
                _ => condition.comparison.to_json(),
            };
            out.insert(condition.field.clone(), value);
        }
        if self.require_joined {
            out.insert("require_joined".to_string(), Value::Bool(true));
        }
        Value::Object(out)
    }
}
