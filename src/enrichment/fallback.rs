//! Conservative default queries for unparseable generator output

use super::predicates;
use super::question::QuestionFacts;
use super::rules;
use super::vocabulary::Vocabulary;
use crate::query::{DocumentQuery, KeyValueQuery, RelationalQuery};
use crate::schema::Entity;

/// Key-value default: the sole named entity's records, else all orders,
/// then the identifier, join and extraction rules
pub fn key_value(facts: &QuestionFacts, vocabulary: &Vocabulary) -> KeyValueQuery {
    let pattern = facts
        .sole_entity()
        .unwrap_or(Entity::Order)
        .wildcard();

    let query = rules::correct_identifier(KeyValueQuery::new(pattern), facts);
    let query = rules::force_join(query, facts);
    rules::apply_predicates(query, &predicates::extract(facts, vocabulary))
}

/// Document default: every document of the sole named entity, else customers
pub fn document(facts: &QuestionFacts, vocabulary: &Vocabulary) -> DocumentQuery {
    let collection = facts.sole_entity().unwrap_or(Entity::Customer).collection();
    rules::apply_document_predicates(
        DocumentQuery::find_all(collection),
        &predicates::extract(facts, vocabulary),
    )
}

/// Relational default: every row of the sole named entity's table, else customers
pub fn relational(facts: &QuestionFacts) -> RelationalQuery {
    let table = facts.sole_entity().unwrap_or(Entity::Customer).collection();
    RelationalQuery::new(format!("SELECT * FROM {};", table))
}
