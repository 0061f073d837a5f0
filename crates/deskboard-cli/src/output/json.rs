//! JSON output for records.

use serde::Serialize;
use serde_json::{Map, Value};

use deskboard_core::storage::{RecordEnvelope, Stored};

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Flatten a stored record into one object.
///
/// The storage fields come first, then the record's own fields, then any
/// derived fields in `extra` (which must be an object or null).
pub fn record_json<R: Serialize>(stored: &Stored<R>, extra: Value) -> anyhow::Result<Value> {
    let mut object = Map::new();
    object.insert("id".to_string(), Value::String(stored.id.to_string()));
    object.insert("created_at".to_string(), serde_json::to_value(stored.created_at)?);
    object.insert("updated_at".to_string(), serde_json::to_value(stored.updated_at)?);

    if let Value::Object(fields) = serde_json::to_value(&stored.record)? {
        object.extend(fields);
    }
    if let Value::Object(fields) = extra {
        object.extend(fields);
    }
    Ok(Value::Object(object))
}

/// A record envelope as exported: kind and id first, payload under `data`.
pub fn envelope_json(envelope: &RecordEnvelope) -> Value {
    serde_json::json!({
        "id": envelope.id,
        "kind": envelope.kind,
        "created_at": envelope.created_at,
        "updated_at": envelope.updated_at,
        "data": envelope.data,
    })
}
