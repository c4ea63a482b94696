//! Prompt templates per store kind

use crate::schema::Schema;
use crate::store::StoreKind;

const SYSTEM_PROMPT: &str =
    "You translate questions about a small retail data set into database queries. \
     Answer with the query only.";

/// System message sent with every request
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Instructions describing the output format expected for `kind`
fn instructions(kind: StoreKind) -> &'static str {
    match kind {
        StoreKind::Sqlite | StoreKind::Postgres => {
            "Generate an SQL query for the question. Return only the SQL query as a string, \
             without any Markdown formatting or additional text. For example, return \
             'SELECT * FROM customers;' directly."
        }
        StoreKind::Document => {
            "Generate a MongoDB query for the question. Return the query as a JSON string in \
             the format {\"collection\": \"<collection_name>\", \"filter\": {<filter_conditions>}}. \
             For example, to find all customers, return {\"collection\": \"customers\", \"filter\": {}}. \
             Ensure the output is valid JSON without any Markdown formatting or additional text."
        }
        StoreKind::KeyValue => {
            "Generate a Redis query for the question. Return the query as a JSON string in the \
             format {\"key\": \"<key_name>\"}. For questions requesting all records of a type \
             (e.g. 'show all customers') use a pattern like 'customer:*'; for a specific record \
             with an ID (e.g. 'show customer with ID 1') use the exact key like 'customer:1'. \
             Examples: 'show all customers' -> {\"key\": \"customer:*\"}; 'what are the orders' -> \
             {\"key\": \"order:*\"}; 'show customer with ID 1' -> {\"key\": \"customer:1\"}. \
             Ensure the output is valid JSON without any Markdown formatting or additional text."
        }
    }
}

/// User message embedding the schema and the question
pub fn user_prompt(question: &str, schema: &Schema, kind: StoreKind) -> String {
    format!(
        "Given the {} schema:\n{}\n\nQuestion:\n{}\n\n{}",
        kind.as_str(),
        schema.describe(),
        question,
        instructions(kind)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_schema_and_question() {
        let schema = Schema::new().with_field("customer", "first_name", "str");
        let prompt = user_prompt("show all customers", &schema, StoreKind::KeyValue);

        assert!(prompt.contains("Table/Collection: customer"));
        assert!(prompt.contains("first_name (str)"));
        assert!(prompt.contains("show all customers"));
        assert!(prompt.contains("customer:*"));
    }

    #[test]
    fn test_relational_prompt_asks_for_sql() {
        let prompt = user_prompt("list orders", &Schema::new(), StoreKind::Postgres);
        assert!(prompt.contains("postgresql"));
        assert!(prompt.contains("SQL query"));
    }
}
