//! The `pdl_person` table
//!
//! One query execution runs, in order:
//! 1. Resolve the API key (config, then `PDL_API_KEY`)
//! 2. Build the enrichment request from the key-column predicates
//! 3. POST it to People Data Labs
//! 4. Decode the response and emit it as a single row
use crate::errors::{ConnectorError, Result};
use crate::models::{Column, ColumnType, EnrichRequest, Row, Transform, KEY_COLUMNS};
use crate::plugin::{Connection, KeyColumns, ListHandler, QueryContext, Table};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Tracing target for the person table.
pub const TRACING_TARGET: &str = "pdl_connector::enrichment";

pub const TABLE_NAME: &str = "pdl_person";

/// List handler for `pdl_person`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonTable;

impl PersonTable {
    pub fn columns() -> Vec<Column> {
        vec![
            Column::new(
                "status",
                ColumnType::Int,
                "Status value returned by the API.",
                Transform::FromField("status"),
            ),
            Column::new(
                "likelihood",
                ColumnType::Double,
                "Match likelihood score.",
                Transform::FromField("likelihood"),
            ),
            Column::new(
                "warnings",
                ColumnType::Json,
                "Any warnings returned by the API.",
                Transform::FromField("warnings"),
            ),
            Column::new(
                "data",
                ColumnType::Json,
                "Enriched person data payload.",
                Transform::FromField("data"),
            ),
            Column::new(
                "raw_response",
                ColumnType::Json,
                "Full API response payload.",
                Transform::FromValue,
            ),
        ]
    }

    pub fn table() -> Table {
        Table::new(
            TABLE_NAME,
            "Retrieve enriched person profiles using the People Data Labs API.",
            KeyColumns::AnyOf(&KEY_COLUMNS),
            Self::columns(),
            Arc::new(PersonTable),
        )
    }
}

#[async_trait]
impl ListHandler for PersonTable {
    async fn list(&self, conn: &Connection, ctx: &QueryContext) -> Result<Vec<Row>> {
        let api_key = conn.config().api_key();
        let request = EnrichRequest::from_quals(&ctx.quals)?;

        let body = conn.client().enrich(&api_key, &request, &ctx.cancel).await?;
        let row = decode_row(&body)?;

        tracing::debug!(target: TRACING_TARGET, "Emitting person row");
        Ok(vec![row])
    }
}

/// Decodes a response body into the top-level JSON object.
pub fn decode_object(body: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ConnectorError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ConnectorError::Decode(e.to_string())),
    }
}

/// Decodes a response body and projects it onto the `pdl_person` columns.
pub fn decode_row(body: &[u8]) -> Result<Row> {
    let item = decode_object(body)?;
    Ok(Row::project(&PersonTable::columns(), &item))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
