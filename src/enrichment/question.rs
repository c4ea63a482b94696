//! Facts extracted once from the natural-language question

use crate::patterns::regex_fn;
use crate::schema::Entity;

regex_fn!(customer_word, r"\bcustomers?\b");
regex_fn!(order_word, r"\borders?\b");
regex_fn!(product_word, r"\bproducts?\b");
regex_fn!(identifier, r"\bid\s*[:#]?\s*(\d+)\b");

/// Lower-cased question plus the entity and identifier mentions in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFacts {
    lower: String,
    entities: Vec<Entity>,
    identifier: Option<u64>,
}

impl QuestionFacts {
    pub fn analyze(question: &str) -> Self {
        let lower = question.to_lowercase();

        let entities = Entity::ALL
            .into_iter()
            .filter(|entity| {
                let word = match entity {
                    Entity::Customer => customer_word(),
                    Entity::Order => order_word(),
                    Entity::Product => product_word(),
                };
                word.is_some_and(|re| re.is_match(&lower))
            })
            .collect();

        let identifier = identifier()
            .and_then(|re| re.captures(&lower))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());

        Self {
            lower,
            entities,
            identifier,
        }
    }

    /// The question, lower-cased
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Mentioned entities in priority order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// First mentioned entity in priority order
    pub fn primary_entity(&self) -> Option<Entity> {
        self.entities.first().copied()
    }

    /// The entity, if exactly one is mentioned
    pub fn sole_entity(&self) -> Option<Entity> {
        match self.entities.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Returns true if two or more distinct entities are mentioned
    pub fn has_join_intent(&self) -> bool {
        self.entities.len() >= 2
    }

    /// Explicit numeric identifier (`ID 7`, `id: 7`, `id #7`)
    pub fn identifier(&self) -> Option<u64> {
        self.identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_in_priority_order() {
        let facts = QuestionFacts::analyze("Which products did each Customer buy?");
        assert_eq!(facts.entities(), &[Entity::Customer, Entity::Product]);
        assert_eq!(facts.primary_entity(), Some(Entity::Customer));
        assert!(facts.has_join_intent());
        assert_eq!(facts.sole_entity(), None);
    }

    #[test]
    fn test_identifier_forms() {
        assert_eq!(QuestionFacts::analyze("show customer with ID 7").identifier(), Some(7));
        assert_eq!(QuestionFacts::analyze("order id: 12").identifier(), Some(12));
        assert_eq!(QuestionFacts::analyze("product id #3").identifier(), Some(3));
        assert_eq!(QuestionFacts::analyze("show all valid orders").identifier(), None);
    }

    #[test]
    fn test_word_boundaries() {
        let facts = QuestionFacts::analyze("list everything reordered by customerservice");
        assert!(facts.entities().is_empty());
    }
}
