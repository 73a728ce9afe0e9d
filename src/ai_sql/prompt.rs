//! Prompt generation for AI SQL queries

use crate::ai_sql::schema::SchemaDescriptor;

/// Builds the prompt sent to the generation provider.
///
/// The schema is fixed at construction so every request of a deployment is
/// grounded on the same tables.
#[derive(Debug, Clone)]
pub struct PromptGenerator {
    schema: SchemaDescriptor,
}

impl PromptGenerator {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn build_prompt(&self, user_query: &str) -> String {
        build_prompt(user_query, &self.schema)
    }
}

/// Generate the MySQL prompt for `user_query` grounded on `schema`
pub fn build_prompt(user_query: &str, schema: &SchemaDescriptor) -> String {
    format!(
        "Generate a MySQL-compatible SQL query based on this unstructured query: '{}'.\n\
         Use the following table schema: {}.\n\
         Make sure the query uses MySQL syntax, including date functions such as NOW() and DATE_SUB().",
        user_query,
        schema.to_json()
    )
}
