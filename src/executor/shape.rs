//! Result shaping for key-value emulation
//!
//! At most one transform is applied, chosen by question phrasing in a fixed
//! priority order. Without a recognized phrase the filtered rows are
//! returned as they are.

use super::result::{Record, ResultTable, Scalar};

/// Phrases requesting spending grouped by customer
const SUM_BY_CUSTOMER: &[&str] = &[
    "total spending",
    "total spent",
    "spent the most",
    "spend the most",
    "spending by customer",
    "spending per customer",
];

/// Phrases requesting sales grouped by category
const SUM_BY_CATEGORY: &[&str] = &["by category", "per category", "each category"];

const MEAN_WORDS: &[&str] = &["average", "avg", "mean"];

/// Mean targets in match order: phrase, output field, row fields
const MEAN_TARGETS: &[(&[&str], &str, &[&str])] = &[
    (
        &["order value", "order total", "total price", "order amount", "spend"],
        "total_price",
        &["total_price"],
    ),
    (&["stock"], "stock_quantity", &["product_stock_quantity", "stock_quantity"]),
    (&["discount"], "discount", &["product_discount", "discount"]),
    (&["credit limit"], "credit_limit", &["customer_credit_limit", "credit_limit"]),
    (&["quantity"], "quantity", &["quantity"]),
    (&["price"], "price", &["product_price", "price"]),
];

/// A result transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    SumByCustomer,
    SumByCategory,
    /// Mean of one field; holds the output field name and candidate row fields
    Mean {
        field: &'static str,
        sources: &'static [&'static str],
    },
    DistinctPhone,
    ProjectEmail,
    ProjectProductName,
    ProjectCustomerName,
}

impl Shape {
    /// Picks the highest-priority transform the question asks for
    pub fn detect(lower_question: &str) -> Option<Shape> {
        let has = |phrases: &[&str]| phrases.iter().any(|p| lower_question.contains(p));

        if has(SUM_BY_CUSTOMER) {
            return Some(Shape::SumByCustomer);
        }
        if has(SUM_BY_CATEGORY) {
            return Some(Shape::SumByCategory);
        }
        if has(MEAN_WORDS) {
            let target = MEAN_TARGETS.iter().find(|(phrases, _, _)| has(phrases));
            if let Some((_, field, sources)) = target {
                return Some(Shape::Mean {
                    field: *field,
                    sources: *sources,
                });
            }
        }
        if lower_question.contains("phone") {
            return Some(Shape::DistinctPhone);
        }
        if lower_question.contains("email") {
            return Some(Shape::ProjectEmail);
        }
        if has(&["product name", "which products"]) {
            return Some(Shape::ProjectProductName);
        }
        if lower_question.contains("customer name") {
            return Some(Shape::ProjectCustomerName);
        }
        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::SumByCustomer => "sum_by_customer",
            Shape::SumByCategory => "sum_by_category",
            Shape::Mean { .. } => "mean",
            Shape::DistinctPhone => "distinct_phone",
            Shape::ProjectEmail => "project_email",
            Shape::ProjectProductName => "project_product_name",
            Shape::ProjectCustomerName => "project_customer_name",
        }
    }

    /// Applies the transform to filtered rows
    pub fn apply(&self, rows: &[Record]) -> ResultTable {
        match self {
            Shape::SumByCustomer => sum_by(rows, "customer_name", "total_spending", customer_group),
            Shape::SumByCategory => sum_by(rows, "category", "total_sales", category_group),
            Shape::Mean { field, sources } => mean(rows, field, sources),
            Shape::DistinctPhone => distinct_phone(rows),
            Shape::ProjectEmail => project(rows, |row| {
                vec![
                    ("name".to_string(), person_name(row).map(Scalar::Text).unwrap_or(Scalar::Null)),
                    ("email".to_string(), first_value(row, &["customer_email", "email"])),
                ]
            }),
            Shape::ProjectProductName => project(rows, |row| {
                let name = match first_value(row, &["product_name"]) {
                    Scalar::Null if is_entity(row, "product") => first_value(row, &["name"]),
                    other => other,
                };
                vec![("product_name".to_string(), name)]
            }),
            Shape::ProjectCustomerName => project(rows, |row| {
                vec![(
                    "customer_name".to_string(),
                    person_name(row).map(Scalar::Text).unwrap_or(Scalar::Null),
                )]
            }),
        }
    }
}

fn lookup<'a>(row: &'a Record, field: &str) -> Option<&'a Scalar> {
    row.iter()
        .find(|(name, value)| name == field && !value.is_null())
        .map(|(_, value)| value)
}

fn first_value(row: &Record, fields: &[&str]) -> Scalar {
    fields
        .iter()
        .find_map(|f| lookup(row, f))
        .cloned()
        .unwrap_or(Scalar::Null)
}

fn is_entity(row: &Record, prefix: &str) -> bool {
    lookup(row, "key")
        .and_then(Scalar::as_str)
        .is_some_and(|key| key.starts_with(&format!("{}:", prefix)))
}

/// "First Last" from merged customer fields or the row's own fields
fn person_name(row: &Record) -> Option<String> {
    for prefix in ["customer_", ""] {
        let first = lookup(row, &format!("{}first_name", prefix)).map(Scalar::render);
        let last = lookup(row, &format!("{}last_name", prefix)).map(Scalar::render);
        let name = match (first, last) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(f), None) => f,
            (None, Some(l)) => l,
            (None, None) => continue,
        };
        return Some(name);
    }
    None
}

fn customer_group(row: &Record) -> Option<(String, String)> {
    let id = lookup(row, "customer_id").map(Scalar::render);
    let name = person_name(row);
    match (id, name) {
        (Some(id), Some(name)) => Some((id, name)),
        (Some(id), None) => Some((id.clone(), format!("customer {}", id))),
        (None, Some(name)) => Some((name.clone(), name)),
        (None, None) => None,
    }
}

fn category_group(row: &Record) -> Option<(String, String)> {
    let category = lookup(row, "product_category")
        .or_else(|| lookup(row, "category"))
        .map(Scalar::render)?;
    Some((category.to_lowercase(), category))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sums `total_price` (or `price` for product rows) per group, largest first
fn sum_by(
    rows: &[Record],
    label_column: &str,
    total_column: &str,
    group: fn(&Record) -> Option<(String, String)>,
) -> ResultTable {
    let mut groups: Vec<(String, String, f64)> = Vec::new();
    for row in rows {
        let Some((key, label)) = group(row) else {
            continue;
        };
        let amount = lookup(row, "total_price")
            .or_else(|| lookup(row, "price"))
            .and_then(Scalar::as_f64)
            .unwrap_or(0.0);
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => entry.2 += amount,
            None => groups.push((key, label, amount)),
        }
    }
    // Stable: ties keep first-seen order
    groups.sort_by(|a, b| b.2.total_cmp(&a.2));

    let rows = groups
        .into_iter()
        .map(|(_, label, total)| vec![Scalar::Text(label), Scalar::Float(round_cents(total))])
        .collect();
    ResultTable::new(vec![label_column.to_string(), total_column.to_string()], rows)
}

fn mean(rows: &[Record], field: &str, sources: &[&str]) -> ResultTable {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| sources.iter().find_map(|s| lookup(row, s)))
        .filter_map(Scalar::as_f64)
        .collect();
    let average = if values.is_empty() {
        Scalar::Null
    } else {
        Scalar::Float(round_cents(values.iter().sum::<f64>() / values.len() as f64))
    };
    ResultTable::new(vec![format!("average_{}", field)], vec![vec![average]])
}

fn distinct_phone(rows: &[Record]) -> ResultTable {
    let mut phones: Vec<Scalar> = Vec::new();
    for row in rows {
        let phone = first_value(row, &["customer_phone", "phone"]);
        if !phone.is_null() && !phones.contains(&phone) {
            phones.push(phone);
        }
    }
    ResultTable::new(
        vec!["phone".to_string()],
        phones.into_iter().map(|p| vec![p]).collect(),
    )
}

fn project(rows: &[Record], pick: impl Fn(&Record) -> Record) -> ResultTable {
    let picked: Vec<Record> = rows.iter().map(pick).collect();
    if picked.is_empty() {
        return ResultTable::empty();
    }
    ResultTable::from_records(picked)
}
