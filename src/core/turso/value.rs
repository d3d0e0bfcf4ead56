use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A scalar cell value after unwrapping the wire representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    /// Only produced when the server sends an untagged JSON boolean.
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Positional bind argument for a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Serialize for Arg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Arg::Null => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", "null")?;
                map.end()
            }
            Arg::Integer(n) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "integer")?;
                map.serialize_entry("value", &n.to_string())?;
                map.end()
            }
            Arg::Float(x) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "float")?;
                map.serialize_entry("value", x)?;
                map.end()
            }
            Arg::Text(s) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("value", s)?;
                map.end()
            }
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Text(value.clone())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Integer(value)
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Integer(value as i64)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Text(value.to_string())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Arg::Null)
    }
}

/// A cell as it appears on the wire: normally `{type, value}`, but plain
/// scalars are accepted too.
#[derive(Debug, Clone, PartialEq)]
pub enum WireCell {
    Tagged { kind: String, value: Option<Json> },
    Plain(Json),
}

impl<'de> Deserialize<'de> for WireCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Ok(match raw {
            Json::Object(mut map) => match map.remove("type") {
                Some(Json::String(kind)) => WireCell::Tagged {
                    kind,
                    value: map.remove("value"),
                },
                Some(other) => {
                    map.insert("type".to_string(), other);
                    WireCell::Plain(Json::Object(map))
                }
                None => WireCell::Plain(Json::Object(map)),
            },
            other => WireCell::Plain(other),
        })
    }
}

fn numeric(value: Json) -> Value {
    match value {
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        Json::String(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                Value::Integer(n)
            } else if let Ok(x) = trimmed.parse::<f64>() {
                Value::Float(x)
            } else {
                Value::Text(s)
            }
        }
        other => plain(other),
    }
}

fn plain(value: Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        Json::String(s) => Value::Text(s),
        nested => Value::Text(nested.to_string()),
    }
}

/// Unwraps a wire cell into a scalar.
///
/// `null`-typed or value-less cells become [`Value::Null`], `integer`/`float`
/// cells become numbers, any other tag becomes text, and untagged scalars
/// pass through unchanged.
pub fn unwrap_cell(cell: WireCell) -> Value {
    match cell {
        WireCell::Tagged { kind, value } => match (kind.as_str(), value) {
            ("null", _) | (_, None) | (_, Some(Json::Null)) => Value::Null,
            ("integer" | "float", Some(v)) => numeric(v),
            (_, Some(Json::String(s))) => Value::Text(s),
            (_, Some(other)) => Value::Text(other.to_string()),
        },
        WireCell::Plain(v) => plain(v),
    }
}

/// Columnar result of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub affected_row_count: u64,
}

/// One result row: column name to scalar, in projection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new(cells: Vec<(String, Value)>) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Display text for `column`; empty for null or missing.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Zips column names with each row of cells.
pub fn to_rows(result: &QueryResult) -> Vec<Row> {
    result
        .rows
        .iter()
        .map(|cells| {
            Row::new(
                result
                    .columns
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect(),
            )
        })
        .collect()
}
