use super::{ExtractError, Record};
use log::warn;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;

/// Append records to a `{"items": [...]}` document at `path`.
///
/// A missing file is created; an unreadable or corrupt one is rewritten from
/// scratch, keeping the export usable across interrupted runs.
pub fn append_records(path: &Path, records: &[Record]) -> Result<(), ExtractError> {
    let mut document = read_document(path);
    if let Some(items) = document.get_mut("items").and_then(Value::as_array_mut) {
        items.extend(records.iter().map(record_to_value));
    }
    fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

/// Load the existing document, or a fresh one when the file is absent,
/// unreadable, or not shaped like `{"items": [...]}`.
fn read_document(path: &Path) -> Value {
    let document = match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(target: "extract", "{} is not valid JSON ({}), rewriting", path.display(), e);
            Value::Null
        }),
        Err(_) => Value::Null,
    };

    if document.get("items").and_then(Value::as_array).is_some() {
        document
    } else {
        json!({ "items": [] })
    }
}

fn record_to_value(record: &Record) -> Value {
    let mut map = Map::new();
    for (key, values) in record.fields() {
        map.insert(
            key.clone(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }
    Value::Object(map)
}
