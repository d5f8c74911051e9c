//! Plain JSON ↔ Firestore typed `Value` conversion.

use serde_json::{json, Map, Value};

use crate::contract::model::Fields;
use crate::domain::store::StoreError;

pub fn encode_value(v: &Value) -> Value {
    match v {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 travels as a decimal string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

pub fn decode_value(v: &Value) -> Result<Value, StoreError> {
    let obj = v
        .as_object()
        .ok_or_else(|| malformed("value is not an object"))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| malformed("value has no type"))?;

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(
            inner
                .as_bool()
                .ok_or_else(|| malformed("booleanValue"))?,
        ),
        "integerValue" => {
            let i = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            }
            .ok_or_else(|| malformed("integerValue"))?;
            Value::from(i)
        }
        "doubleValue" => match inner {
            Value::Number(n) => Value::Number(n.clone()),
            // NaN / Infinity arrive as strings and have no JSON form
            _ => Value::Null,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Value::String(
            inner
                .as_str()
                .ok_or_else(|| malformed(kind))?
                .to_string(),
        ),
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        }),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))?),
        other => return Err(malformed(&format!("unsupported value type '{}'", other))),
    })
}

/// Decode a `fields` object; an absent object means no fields.
pub fn decode_fields(fields: Option<&Value>) -> Result<Fields, StoreError> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    fields
        .as_object()
        .ok_or_else(|| malformed("fields is not an object"))?
        .iter()
        .map(|(k, v)| -> Result<(String, Value), StoreError> { Ok((k.clone(), decode_value(v)?)) })
        .collect()
}

fn malformed(what: &str) -> StoreError {
    StoreError::invalid_request(format!("malformed Firestore value: {}", what))
}
