use crate::errors::{ConnectorError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// ============ Query Input ============

/// Identity columns the enrichment endpoint accepts.
pub const KEY_COLUMNS: [&str; 4] = ["email", "phone", "profile", "name"];

/// Equality predicates supplied by the caller for one query execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quals {
    values: BTreeMap<String, String>,
}

impl Quals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the equality predicate on `column`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

}

impl<K, V> FromIterator<(K, V)> for Quals
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut quals = Quals::new();
        for (k, v) in iter {
            quals.insert(k, v);
        }
        quals
    }
}

// ============ Enrichment Request ============

/// Body of `POST /v5/person/enrich`.
///
/// Only supplied identity attributes are serialized; absent ones are
/// omitted rather than sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EnrichRequest {
    /// Builds the request from the recognized key columns in `quals`.
    ///
    /// Values are copied verbatim. Any other predicate is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MissingPredicate`] when none of
    /// `email`, `phone`, `profile` or `name` is present.
    pub fn from_quals(quals: &Quals) -> Result<Self> {
        let take = |column: &str| quals.get(column).map(str::to_string);

        let request = Self {
            email: take("email"),
            phone: take("phone"),
            profile: take("profile"),
            name: take("name"),
        };

        if request.is_empty() {
            return Err(ConnectorError::MissingPredicate);
        }

        Ok(request)
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.profile.is_none() && self.name.is_none()
    }

    /// Serializes the request body.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(ConnectorError::Encoding)
    }
}

// ============ Table Schema ============

/// Column value types understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Double,
    Json,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Double => "double",
            ColumnType::Json => "json",
        }
    }
}

/// How a column is derived from a decoded list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Top-level field of the item, coerced to the column type.
    FromField(&'static str),
    /// The whole item, unmodified.
    FromValue,
}

/// A table column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub description: &'static str,
    pub transform: Transform,
}

impl Column {
    pub const fn new(
        name: &'static str,
        ty: ColumnType,
        description: &'static str,
        transform: Transform,
    ) -> Self {
        Self {
            name,
            ty,
            description,
            transform,
        }
    }
}

// ============ Rows ============

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Int(i64),
    Double(f64),
    Json(Value),
}

impl ColumnValue {
    /// Coerces a JSON value into a cell of type `ty`.
    ///
    /// `None` and JSON `null` become [`ColumnValue::Null`]. Integers wider
    /// than `i64` saturate, floats truncate toward zero, numeric strings are
    /// parsed, and anything else that does not fit the type is `Null`.
    pub fn coerce(value: Option<&Value>, ty: ColumnType) -> Self {
        let value = match value {
            None | Some(Value::Null) => return ColumnValue::Null,
            Some(v) => v,
        };

        match ty {
            ColumnType::Json => ColumnValue::Json(value.clone()),
            ColumnType::Int => to_i64(value).map_or(ColumnValue::Null, ColumnValue::Int),
            ColumnType::Double => to_f64(value).map_or(ColumnValue::Null, ColumnValue::Double),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ColumnValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

impl From<&ColumnValue> for Value {
    fn from(value: &ColumnValue) -> Self {
        match value {
            ColumnValue::Null => Value::Null,
            ColumnValue::Int(i) => Value::from(*i),
            ColumnValue::Double(f) => Value::from(*f),
            ColumnValue::Json(j) => j.clone(),
        }
    }
}

fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            // `as` saturates and truncates toward zero
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// One result row, cells in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(&'static str, ColumnValue)>,
}

impl Row {
    /// Projects a decoded item through the given columns.
    pub fn project(columns: &[Column], item: &serde_json::Map<String, Value>) -> Self {
        let cells = columns
            .iter()
            .map(|column| {
                let value = match column.transform {
                    Transform::FromField(field) => ColumnValue::coerce(item.get(field), column.ty),
                    Transform::FromValue => ColumnValue::Json(Value::Object(item.clone())),
                };
                (column.name, value)
            })
            .collect();

        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Renders the row as a JSON object keyed by column name.
    pub fn to_json(&self) -> Value {
        let map = self
            .cells
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_copies_values_verbatim() {
        let quals = Quals::new()
            .with("email", "  Jane@Example.COM ")
            .with("name", "jane doe");
        let request = EnrichRequest::from_quals(&quals).unwrap();

        assert_eq!(request.email.as_deref(), Some("  Jane@Example.COM "));
        assert_eq!(request.name.as_deref(), Some("jane doe"));
        assert!(request.phone.is_none());
        assert!(request.profile.is_none());
    }

    #[test]
    fn test_request_omits_absent_keys() {
        let request = EnrichRequest::from_quals(&Quals::new().with("phone", "+15555550100")).unwrap();
        let body: Value = serde_json::from_slice(&request.to_body().unwrap()).unwrap();
        assert_eq!(body, json!({"phone": "+15555550100"}));
    }

    #[test]
    fn test_request_ignores_unknown_quals() {
        let quals = Quals::new().with("company", "acme").with("profile", "linkedin.com/in/jd");
        let request = EnrichRequest::from_quals(&quals).unwrap();
        let body: Value = serde_json::from_slice(&request.to_body().unwrap()).unwrap();
        assert_eq!(body, json!({"profile": "linkedin.com/in/jd"}));
    }

    #[test]
    fn test_request_requires_a_key_column() {
        let err = EnrichRequest::from_quals(&Quals::new()).unwrap_err();
        assert!(matches!(err, ConnectorError::MissingPredicate));

        let err = EnrichRequest::from_quals(&Quals::new().with("company", "acme")).unwrap_err();
        assert!(matches!(err, ConnectorError::MissingPredicate));
    }

    #[test]
    fn test_empty_string_qual_still_counts() {
        let request = EnrichRequest::from_quals(&Quals::new().with("email", "")).unwrap();
        assert_eq!(request.email.as_deref(), Some(""));
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(ColumnValue::coerce(Some(&json!(200)), ColumnType::Int), ColumnValue::Int(200));
        assert_eq!(ColumnValue::coerce(Some(&json!(404.9)), ColumnType::Int), ColumnValue::Int(404));
        assert_eq!(ColumnValue::coerce(Some(&json!("201")), ColumnType::Int), ColumnValue::Int(201));
        assert_eq!(
            ColumnValue::coerce(Some(&json!(u64::MAX)), ColumnType::Int),
            ColumnValue::Int(i64::MAX)
        );
        assert_eq!(
            ColumnValue::coerce(Some(&json!(-1e300)), ColumnType::Int),
            ColumnValue::Int(i64::MIN)
        );
        assert!(ColumnValue::coerce(Some(&json!("abc")), ColumnType::Int).is_null());
        assert!(ColumnValue::coerce(Some(&json!([1])), ColumnType::Int).is_null());
        assert!(ColumnValue::coerce(None, ColumnType::Int).is_null());
        assert!(ColumnValue::coerce(Some(&Value::Null), ColumnType::Int).is_null());
    }

    #[test]
    fn test_coerce_double() {
        assert_eq!(
            ColumnValue::coerce(Some(&json!(8.5)), ColumnType::Double),
            ColumnValue::Double(8.5)
        );
        assert_eq!(
            ColumnValue::coerce(Some(&json!(7)), ColumnType::Double),
            ColumnValue::Double(7.0)
        );
        assert_eq!(
            ColumnValue::coerce(Some(&json!("9.25")), ColumnType::Double),
            ColumnValue::Double(9.25)
        );
        assert!(ColumnValue::coerce(Some(&json!({})), ColumnType::Double).is_null());
    }

    #[test]
    fn test_coerce_json_passes_through() {
        let warnings = json!(["low confidence"]);
        assert_eq!(
            ColumnValue::coerce(Some(&warnings), ColumnType::Json),
            ColumnValue::Json(warnings)
        );
    }

    #[test]
    fn test_row_projection_keeps_schema_order() {
        let columns = [
            Column::new("status", ColumnType::Int, "", Transform::FromField("status")),
            Column::new("raw", ColumnType::Json, "", Transform::FromValue),
        ];
        let item = json!({"status": 200, "extra": true});
        let row = Row::project(&columns, item.as_object().unwrap());

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["status", "raw"]);
        assert_eq!(row.get("status").and_then(ColumnValue::as_i64), Some(200));
        assert_eq!(row.get("raw").and_then(ColumnValue::as_json), Some(&item));
        assert_eq!(row.to_json(), json!({"status": 200, "raw": item}));
    }
}
