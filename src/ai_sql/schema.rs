//! Table descriptions handed to the model as grounding
//!
//! The model has no access to the database, so the only thing keeping its
//! table and column names honest is the descriptor embedded in every prompt.
//! A descriptor is built once at startup and shared read-only afterwards.

use crate::ai_sql::error::{AiError, AiResult};
use serde::{Deserialize, Serialize};

/// One table and its columns, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub table_name: String,
    pub columns: Vec<String>,
}

impl TableDescriptor {
    pub fn new(table_name: &str, columns: &[&str]) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Ordered, non-empty list of tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableDescriptor>) -> AiResult<Self> {
        if tables.is_empty() {
            return Err(AiError::SchemaError(
                "schema must describe at least one table".to_string(),
            ));
        }

        if let Some(position) = tables
            .iter()
            .position(|t| t.table_name.trim().is_empty())
        {
            return Err(AiError::SchemaError(format!(
                "table #{} has no name",
                position + 1
            )));
        }

        Ok(Self { tables })
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table_name.as_str())
    }

    /// Compact JSON form used inside prompts
    pub fn to_json(&self) -> String {
        // Serializing plain strings into a Vec cannot fail
        serde_json::to_string(&self.tables).unwrap_or_default()
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self {
            tables: vec![
                TableDescriptor::new(
                    "sales_data",
                    &["sale_id", "product_id", "quantity_sold", "sale_date", "total_price"],
                ),
                TableDescriptor::new(
                    "products",
                    &["product_id", "name", "category", "price", "stock_quantity"],
                ),
                TableDescriptor::new(
                    "customer_queries",
                    &["query_id", "query_date", "query_text", "response_text"],
                ),
            ],
        }
    }
}
