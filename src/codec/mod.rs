pub mod varint;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind, Result};
use varint::{read_varint, write_varint, MAX_VARINT_VALUE};

/// Wire encoding of a persisted posting chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "delta-varint")]
    DeltaVarint,
    #[serde(rename = "json")]
    Json,
}

/// A single value inside a posting chunk. The engine stores posting lists
/// as JSON strings, so the text variant is the common case; all-integer
/// lists take the compact delta path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkValue {
    Integer(u64),
    Text(String),
}

/// Encode a chunk. All-integer input is sorted ascending and written as
/// successive deltas in base-128 varints (the first value is the delta
/// from zero); anything else is serialised in original order as a JSON
/// array. Empty input yields empty bytes under the delta encoding.
pub fn encode(values: &[ChunkValue]) -> Result<(Vec<u8>, Encoding)> {
    if values.is_empty() {
        return Ok((Vec::new(), Encoding::DeltaVarint));
    }

    let mut integers = Vec::with_capacity(values.len());
    for value in values {
        match value {
            // Values past the 5-byte varint cap fall through to JSON
            ChunkValue::Integer(n) if *n <= MAX_VARINT_VALUE => integers.push(*n),
            _ => {
                let payload = serde_json::to_vec(values)?;
                return Ok((payload, Encoding::Json));
            }
        }
    }

    integers.sort_unstable();
    let mut output = Vec::new();
    let mut previous = 0u64;
    for n in integers {
        write_varint(&mut output, n - previous);
        previous = n;
    }
    Ok((output, Encoding::DeltaVarint))
}

/// Decode a chunk previously produced by [`encode`].
pub fn decode(payload: &[u8], encoding: Encoding) -> Result<Vec<ChunkValue>> {
    match encoding {
        Encoding::DeltaVarint => decode_delta_varint(payload),
        Encoding::Json => decode_json(payload),
    }
}

fn decode_delta_varint(payload: &[u8]) -> Result<Vec<ChunkValue>> {
    let mut values = Vec::new();
    let mut position = 0usize;
    let mut previous = 0u64;

    while position < payload.len() {
        let (delta, consumed) = read_varint(&payload[position..])?;
        previous += delta;
        values.push(ChunkValue::Integer(previous));
        position += consumed;
    }

    Ok(values)
}

fn decode_json(payload: &[u8]) -> Result<Vec<ChunkValue>> {
    let parsed: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| Error::new(ErrorKind::Codec, format!("invalid JSON payload: {}", e)))?;

    let items = match parsed {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(Error::new(
                ErrorKind::Codec,
                format!("expected JSON array, got {}", json_kind(&other)),
            ))
        }
    };

    let mut values = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::String(s) => values.push(ChunkValue::Text(s)),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(v) => values.push(ChunkValue::Integer(v)),
                None => {
                    return Err(Error::new(
                        ErrorKind::Codec,
                        format!("unsupported chunk number {}", n),
                    ))
                }
            },
            other => {
                return Err(Error::new(
                    ErrorKind::Codec,
                    format!("unsupported chunk value of type {}", json_kind(&other)),
                ))
            }
        }
    }
    Ok(values)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
