//! Row predicates for key-value emulation
//!
//! Every filter of a query is evaluated against a merged row with AND
//! semantics. Numeric and date filters coerce the stored value; a value
//! that cannot be coerced is a `PredicateError`, never a silent mismatch.

use chrono::{Datelike, NaiveDate};

use super::errors::PredicateError;
use super::result::{Record, Scalar};
use crate::query::{Comparator, Comparison, FieldCondition, FilterClause, FilterName, FilterValue, KeyValueQuery};

const EPSILON: f64 = 1e-9;

/// Row fields a named filter is evaluated against; the first present wins
pub fn target_fields(name: FilterName) -> &'static [&'static str] {
    match name {
        FilterName::Price => &["product_price", "price"],
        FilterName::Discount => &["product_discount", "discount"],
        FilterName::Stock => &["product_stock_quantity", "stock_quantity"],
        FilterName::CreditLimit => &["customer_credit_limit", "credit_limit"],
        FilterName::ReleaseDate => &["product_release_date", "release_date"],
        FilterName::OrderDate => &["order_date"],
        FilterName::Year => &[
            "order_date",
            "product_release_date",
            "release_date",
            "customer_registration_date",
            "registration_date",
        ],
        FilterName::Category => &["product_category", "category"],
        FilterName::Manufacturer => &["product_manufacturer", "manufacturer"],
        FilterName::City => &["customer_city", "city"],
    }
}

fn lookup<'a>(row: &'a Record, field: &str) -> Option<&'a Scalar> {
    row.iter()
        .find(|(name, value)| name == field && !value.is_null())
        .map(|(_, value)| value)
}

fn first_present<'a>(row: &'a Record, fields: &[&'static str]) -> Option<(&'static str, &'a Scalar)> {
    fields
        .iter()
        .find_map(|field| lookup(row, field).map(|value| (*field, value)))
}

/// Evaluates query filters against rows
pub struct PredicateFilter;

impl PredicateFilter {
    /// Returns true if the row satisfies every filter of the query
    pub fn matches(row: &Record, query: &KeyValueQuery) -> Result<bool, PredicateError> {
        for (name, clause) in query.filters.clauses() {
            if !Self::matches_clause(row, name, &clause)? {
                return Ok(false);
            }
        }
        for condition in &query.field_conditions {
            if !Self::matches_condition(row, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_clause(
        row: &Record,
        name: FilterName,
        clause: &FilterClause,
    ) -> Result<bool, PredicateError> {
        // A row without any target field does not match
        let Some((field, stored)) = first_present(row, target_fields(name)) else {
            return Ok(false);
        };

        match clause {
            FilterClause::Match(expected) => Ok(stored.render().eq_ignore_ascii_case(expected)),
            FilterClause::Compare(comparison) if name == FilterName::Year => {
                Self::year_match(field, stored, comparison)
            }
            FilterClause::Compare(comparison) if name.is_date() => {
                Self::date_match(field, stored, comparison)
            }
            FilterClause::Compare(comparison) => Self::numeric_match(field, stored, comparison),
        }
    }

    fn numeric_match(
        field: &str,
        stored: &Scalar,
        comparison: &Comparison,
    ) -> Result<bool, PredicateError> {
        let FilterValue::Number(bound) = comparison.value else {
            return Err(PredicateError::new(
                field,
                format!("operand {:?} is not numeric", comparison.value),
            ));
        };
        let actual = stored.as_f64().ok_or_else(|| {
            PredicateError::new(field, format!("stored value {:?} is not numeric", stored.render()))
        })?;
        Ok(compare_f64(actual, comparison.comparator, bound))
    }

    fn date_match(
        field: &str,
        stored: &Scalar,
        comparison: &Comparison,
    ) -> Result<bool, PredicateError> {
        let FilterValue::Date(bound) = comparison.value else {
            return Err(PredicateError::new(
                field,
                format!("operand {:?} is not a date", comparison.value),
            ));
        };
        let actual = stored_date(stored).ok_or_else(|| {
            PredicateError::new(field, format!("stored value {:?} is not a date", stored.render()))
        })?;
        Ok(match comparison.comparator {
            Comparator::Gt => actual > bound,
            Comparator::Lt => actual < bound,
            Comparator::Eq => actual == bound,
        })
    }

    fn year_match(
        field: &str,
        stored: &Scalar,
        comparison: &Comparison,
    ) -> Result<bool, PredicateError> {
        let FilterValue::Number(bound) = comparison.value else {
            return Err(PredicateError::new(
                field,
                format!("operand {:?} is not a year", comparison.value),
            ));
        };
        let year = stored_date(stored).map(|d| d.year()).ok_or_else(|| {
            PredicateError::new(field, format!("stored value {:?} is not a date", stored.render()))
        })?;
        Ok(compare_f64(f64::from(year), comparison.comparator, bound))
    }

    fn matches_condition(row: &Record, condition: &FieldCondition) -> Result<bool, PredicateError> {
        let field = condition.field.as_str();
        let candidates = [
            field.to_string(),
            format!("product_{}", field),
            format!("customer_{}", field),
        ];
        let Some((field, stored)) = candidates
            .iter()
            .find_map(|f| lookup(row, f).map(|v| (f.as_str(), v)))
        else {
            return Ok(false);
        };

        let comparison = &condition.comparison;
        match &comparison.value {
            FilterValue::Number(_) => Self::numeric_match(field, stored, comparison),
            FilterValue::Date(_) => Self::date_match(field, stored, comparison),
            FilterValue::Text(expected) => {
                let actual = stored.render();
                Ok(match comparison.comparator {
                    Comparator::Eq => actual.eq_ignore_ascii_case(expected),
                    Comparator::Gt => actual.as_str() > expected.as_str(),
                    Comparator::Lt => actual.as_str() < expected.as_str(),
                })
            }
        }
    }
}

fn compare_f64(actual: f64, comparator: Comparator, bound: f64) -> bool {
    match comparator {
        Comparator::Gt => actual > bound,
        Comparator::Lt => actual < bound,
        Comparator::Eq => (actual - bound).abs() < EPSILON,
    }
}

/// Date prefix of a stored value (`2024-01-05` or `2024-01-05 10:30:00`)
fn stored_date(stored: &Scalar) -> Option<NaiveDate> {
    let text = stored.as_str()?.trim();
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
