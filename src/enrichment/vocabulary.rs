//! Closed vocabularies for categorical filters

use serde::{Deserialize, Serialize};

fn default_categories() -> Vec<String> {
    vec!["Electronics".to_string(), "Clothing".to_string()]
}

fn default_manufacturers() -> Vec<String> {
    vec![
        "TechCorp".to_string(),
        "FashionInc".to_string(),
        "SoundTech".to_string(),
    ]
}

fn default_cities() -> Vec<String> {
    vec![
        "New York".to_string(),
        "London".to_string(),
        "Toronto".to_string(),
        "Sydney".to_string(),
    ]
}

/// Category, manufacturer and city names recognized in questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_manufacturers")]
    pub manufacturers: Vec<String>,
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            manufacturers: default_manufacturers(),
            cities: default_cities(),
        }
    }
}

impl Vocabulary {
    pub fn category_in(&self, lower_question: &str) -> Option<String> {
        first_term(&self.categories, lower_question)
    }

    pub fn manufacturer_in(&self, lower_question: &str) -> Option<String> {
        first_term(&self.manufacturers, lower_question)
    }

    pub fn city_in(&self, lower_question: &str) -> Option<String> {
        first_term(&self.cities, lower_question)
    }
}

/// First vocabulary term (in list order) occurring as a whole word
fn first_term(terms: &[String], lower_question: &str) -> Option<String> {
    terms
        .iter()
        .find(|term| contains_word(lower_question, &term.to_lowercase()))
        .cloned()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
