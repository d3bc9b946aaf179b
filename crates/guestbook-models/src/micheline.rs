//! Micheline (JSON) codec for the guestbook storage.
//!
//! The contract storage is `list (pair address (pair timestamp string))`.
//! Nodes are expected in readable form:
//!
//! ```text
//! [
//!   { "prim": "Pair", "args": [
//!       { "string": "tz1…" },
//!       { "prim": "Pair", "args": [ { "string": "2021-06-01T12:00:00Z" }, { "string": "Hello" } ] }
//!   ] },
//!   …
//! ]
//! ```
//!
//! A flattened `Pair` with three arguments is accepted as well, and
//! timestamps may be `{"int": "<unix seconds>"}`. Entries are returned in
//! storage order.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::address::Address;
use crate::entry::Entry;
use crate::error::ModelError;

fn malformed(reason: impl Into<String>) -> ModelError {
    ModelError::MalformedStorage(reason.into())
}

/// Decode the full storage value into entries.
pub fn decode_entries(storage: &Value) -> Result<Vec<Entry>, ModelError> {
    let items = storage
        .as_array()
        .ok_or_else(|| malformed("expected a list at the storage root"))?;
    items.iter().map(decode_entry).collect()
}

/// Encode entries as the readable Micheline list the RPC would return.
pub fn encode_entries(entries: &[Entry]) -> Value {
    Value::Array(entries.iter().map(encode_entry).collect())
}

fn encode_entry(entry: &Entry) -> Value {
    json!({
        "prim": "Pair",
        "args": [
            { "string": entry.address.as_str() },
            { "prim": "Pair", "args": [
                { "string": entry.date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true) },
                { "string": entry.text },
            ] },
        ]
    })
}

fn decode_entry(node: &Value) -> Result<Entry, ModelError> {
    let args = pair_args(node)?;
    let (address, date, text) = match args {
        [address, rest] => match pair_args(rest)? {
            [date, text] => (address, date, text),
            other => return Err(malformed(format!("expected 2 nested pair args, got {}", other.len()))),
        },
        [address, date, text] => (address, date, text),
        other => return Err(malformed(format!("expected 2 or 3 pair args, got {}", other.len()))),
    };

    Ok(Entry {
        address: decode_address(address)?,
        date: decode_timestamp(date)?,
        text: decode_string(text)?.to_string(),
    })
}

fn pair_args(node: &Value) -> Result<&[Value], ModelError> {
    if node.get("prim").and_then(Value::as_str) != Some("Pair") {
        return Err(malformed(format!("expected a Pair, got {node}")));
    }
    node.get("args")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| malformed("Pair without args"))
}

fn decode_string(node: &Value) -> Result<&str, ModelError> {
    node.get("string")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("expected a string node, got {node}")))
}

fn decode_address(node: &Value) -> Result<Address, ModelError> {
    if node.get("bytes").is_some() {
        return Err(malformed(
            "address in optimized (bytes) form; request readable storage",
        ));
    }
    decode_string(node).map(Address::new)
}

fn decode_timestamp(node: &Value) -> Result<DateTime<Utc>, ModelError> {
    if let Some(s) = node.get("string").and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| malformed(format!("bad timestamp \"{s}\": {e}")));
    }
    if let Some(s) = node.get("int").and_then(Value::as_str) {
        let secs: i64 = s
            .parse()
            .map_err(|_| malformed(format!("bad timestamp \"{s}\"")))?;
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| malformed(format!("timestamp {secs} out of range")));
    }
    Err(malformed(format!("expected a timestamp node, got {node}")))
}
