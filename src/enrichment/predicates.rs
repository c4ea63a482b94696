//! Typed predicate and categorical extraction from question text

use regex::Regex;

use super::question::QuestionFacts;
use super::vocabulary::Vocabulary;
use crate::patterns::regex_fn;
use crate::query::{Comparator, Comparison, FilterClause, FilterName, FilterValue};

// Attribute word, a gap with no clause break, then a comparator and a number.
regex_fn!(
    price_comparison,
    r"\b(?:prices?|priced|costs?|costing)\b([^.;]*?)\b(greater than|more than|higher than|above|over|exceeding|less than|lower than|cheaper than|below|under)\s+\$?(\d+(?:\.\d+)?)"
);
regex_fn!(
    discount_comparison,
    r"\bdiscounts?(?:ed)?\b([^.;]*?)\b(greater than|more than|higher than|above|over|exceeding|less than|lower than|below|under)\s+(\d+(?:\.\d+)?)"
);
regex_fn!(
    stock_comparison,
    r"\bstock(?:\s+quantity|\s+quantities)?\b([^.;]*?)\b(greater than|more than|higher than|above|over|exceeding|less than|lower than|fewer than|below|under)\s+(\d+(?:\.\d+)?)"
);
regex_fn!(
    credit_limit_comparison,
    r"\bcredit\s+limits?\b([^.;]*?)\b(greater than|more than|higher than|above|over|exceeding|less than|lower than|below|under)\s+\$?(\d+(?:\.\d+)?)"
);
regex_fn!(
    release_date_bound,
    r"\breleas(?:e|ed|ing)\b([^.;]*?)\b(before|after)\s+(\d{4}-\d{2}-\d{2})"
);
regex_fn!(
    order_date_bound,
    r"\b(?:orders?|ordered|placed|purchased|bought)\b([^.;]*?)\b(before|after)\s+(\d{4}-\d{2}-\d{2})"
);
regex_fn!(year_mention, r"\bin\s+((?:19|20)\d{2})\b");

/// Attribute words that end a comparison's reach
const ATTRIBUTE_WORDS: &[&str] = &["price", "cost", "discount", "stock", "credit limit", "releas"];

fn comparator_for(phrase: &str) -> Comparator {
    match phrase {
        "greater than" | "more than" | "higher than" | "above" | "over" | "exceeding"
        | "after" => Comparator::Gt,
        _ => Comparator::Lt,
    }
}

/// First comparison matched by `re` whose gap mentions no other attribute
fn numeric_comparison(re: Option<&Regex>, text: &str) -> Option<(Comparator, f64)> {
    re?.captures_iter(text).find_map(|caps| {
        let gap = caps.get(1)?.as_str();
        if ATTRIBUTE_WORDS.iter().any(|w| gap.contains(w)) {
            return None;
        }
        let comparator = comparator_for(caps.get(2)?.as_str());
        let value = caps.get(3)?.as_str().parse::<f64>().ok()?;
        Some((comparator, value))
    })
}

fn date_bound(re: Option<&Regex>, text: &str, skip_release: bool) -> Option<Comparison> {
    re?.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?.as_str();
        if skip_release && whole.contains("releas") {
            return None;
        }
        let comparator = comparator_for(caps.get(2)?.as_str());
        match FilterValue::date_from_str(caps.get(3)?.as_str()) {
            date @ FilterValue::Date(_) => Some(Comparison::new(comparator, date)),
            _ => None,
        }
    })
}

fn year(text: &str) -> Option<Comparison> {
    year_mention()?.captures_iter(text).find_map(|caps| {
        let m = caps.get(1)?;
        // `in 2023-05-01` is a date, not a year
        if text[m.end()..].starts_with('-') {
            return None;
        }
        m.as_str().parse::<f64>().ok().map(Comparison::eq)
    })
}

/// Extracts typed comparisons and vocabulary matches from the question.
///
/// Returned clauses are in canonical slot order, at most one per slot.
pub fn extract(facts: &QuestionFacts, vocabulary: &Vocabulary) -> Vec<(FilterName, FilterClause)> {
    let text = facts.lower();
    let mut clauses = Vec::new();
    let mut push = |name: FilterName, comparison: Option<Comparison>| {
        if let Some(c) = comparison {
            clauses.push((name, FilterClause::Compare(c)));
        }
    };

    push(
        FilterName::Price,
        numeric_comparison(price_comparison(), text).map(|(c, v)| Comparison::new(c, FilterValue::Number(v))),
    );
    push(
        FilterName::Discount,
        numeric_comparison(discount_comparison(), text).map(|(c, v)| {
            // Fractions are percentages written as 0.x
            let v = if v < 1.0 { v * 100.0 } else { v };
            Comparison::new(c, FilterValue::Number(v))
        }),
    );
    push(
        FilterName::Stock,
        numeric_comparison(stock_comparison(), text).map(|(c, v)| Comparison::new(c, FilterValue::Number(v))),
    );
    push(
        FilterName::CreditLimit,
        numeric_comparison(credit_limit_comparison(), text)
            .map(|(c, v)| Comparison::new(c, FilterValue::Number(v))),
    );
    push(FilterName::ReleaseDate, date_bound(release_date_bound(), text, false));
    push(FilterName::OrderDate, date_bound(order_date_bound(), text, true));
    push(FilterName::Year, year(text));

    let categorical = [
        (FilterName::Category, vocabulary.category_in(text)),
        (FilterName::Manufacturer, vocabulary.manufacturer_in(text)),
        (FilterName::City, vocabulary.city_in(text)),
    ];
    for (name, term) in categorical {
        if let Some(term) = term {
            clauses.push((name, FilterClause::Match(term)));
        }
    }

    clauses
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(question: &str) -> Vec<(FilterName, FilterClause)> {
        extract(&QuestionFacts::analyze(question), &Vocabulary::default())
    }

    fn compare(clauses: &[(FilterName, FilterClause)], name: FilterName) -> Option<Comparison> {
        clauses.iter().find_map(|(n, c)| match c {
            FilterClause::Compare(cmp) if *n == name => Some(cmp.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_price_greater_than() {
        let clauses = run("products with price greater than 500");
        assert_eq!(compare(&clauses, FilterName::Price), Some(Comparison::gt(500.0)));
    }

    #[test]
    fn test_multiple_attributes_do_not_bleed() {
        let clauses = run("products with price below $100 and stock quantity above 20");
        assert_eq!(compare(&clauses, FilterName::Price), Some(Comparison::lt(100.0)));
        assert_eq!(compare(&clauses, FilterName::Stock), Some(Comparison::gt(20.0)));

        let clauses = run("price of products whose stock is under 5");
        assert_eq!(compare(&clauses, FilterName::Price), None);
        assert_eq!(compare(&clauses, FilterName::Stock), Some(Comparison::lt(5.0)));
    }

    #[test]
    fn test_discount_fraction_is_scaled() {
        let clauses = run("products with a discount above 0.15");
        let discount = compare(&clauses, FilterName::Discount).unwrap();
        assert_eq!(discount.comparator, Comparator::Gt);
        match discount.value {
            FilterValue::Number(v) => assert!((v - 15.0).abs() < 1e-9),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_dates_and_year() {
        let clauses = run("products released after 2023-01-01");
        let release = compare(&clauses, FilterName::ReleaseDate).unwrap();
        assert_eq!(release.comparator, Comparator::Gt);
        assert_eq!(compare(&clauses, FilterName::OrderDate), None);

        let clauses = run("orders placed before 2024-03-15");
        assert_eq!(compare(&clauses, FilterName::OrderDate).unwrap().comparator, Comparator::Lt);

        let clauses = run("orders in 2023");
        assert_eq!(compare(&clauses, FilterName::Year), Some(Comparison::eq(2023.0)));

        let clauses = run("orders in 2023-05-01");
        assert_eq!(compare(&clauses, FilterName::Year), None);
    }

    #[test]
    fn test_categorical_terms() {
        let clauses = run("Electronics products from TechCorp for customers in London");
        let matched: Vec<_> = clauses
            .iter()
            .filter_map(|(n, c)| match c {
                FilterClause::Match(term) => Some((*n, term.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            matched,
            vec![
                (FilterName::Category, "Electronics"),
                (FilterName::Manufacturer, "TechCorp"),
                (FilterName::City, "London"),
            ]
        );
    }
}
