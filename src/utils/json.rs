use bson::{Bson, Document as BsonDocument};
use serde_json::{Map, Number, Value};
use std::io;

const DATE_KEY: &str = "$date";

/// Convert a BSON value into JSON. Datetimes become `{"$date": <millis>}` so they survive a
/// round trip through `json_to_bson`.
#[must_use]
pub fn bson_to_json(v: &Bson) -> Value {
    match v {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Number(Number::from(*i)),
        Bson::Int64(i) => Value::Number(Number::from(*i)),
        Bson::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(d) => document_to_json(d),
        Bson::DateTime(dt) => {
            let mut m = Map::new();
            m.insert(DATE_KEY.to_string(), Value::Number(Number::from(dt.timestamp_millis())));
            Value::Object(m)
        }
        other => Value::String(other.to_string()),
    }
}

#[must_use]
pub fn document_to_json(doc: &BsonDocument) -> Value {
    let mut m = Map::new();
    for (k, v) in doc {
        m.insert(k.clone(), bson_to_json(v));
    }
    Value::Object(m)
}

/// Inverse of `bson_to_json`. Integers that fit in 32 bits come back as `Int32`.
#[must_use]
pub fn json_to_bson(v: &Value) -> Bson {
    match v {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32)
            } else {
                n.as_f64().map_or(Bson::Null, Bson::Double)
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(m) => {
            if m.len() == 1
                && let Some(ms) = m.get(DATE_KEY).and_then(Value::as_i64)
            {
                return Bson::DateTime(bson::DateTime::from_millis(ms));
            }
            Bson::Document(map_to_document(m))
        }
    }
}

fn map_to_document(m: &Map<String, Value>) -> BsonDocument {
    let mut out = BsonDocument::new();
    for (k, v) in m {
        out.insert(k.clone(), json_to_bson(v));
    }
    out
}

/// Convert a JSON value that must be an object into a `bson::Document`.
/// Returns `io::Error` with `InvalidData` on malformed input.
pub fn json_value_to_bson_document(val: &Value) -> io::Result<BsonDocument> {
    let obj = val
        .as_object()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "expected JSON object"))?;
    Ok(map_to_document(obj))
}

/// Parse a JSON string into a `bson::Document`. The JSON must be a top-level object.
pub fn parse_json_to_bson_document(json: &str) -> io::Result<BsonDocument> {
    let val: Value =
        serde_json::from_str(json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    json_value_to_bson_document(&val)
}
