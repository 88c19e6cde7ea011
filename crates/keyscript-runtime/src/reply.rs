//! Decoding script replies into Rust values.

use std::collections::HashMap;

use rhizome_keyscript_core::JsonType;
use serde::Serialize;
use thiserror::Error;

/// A reply did not have the shape its command produces.
#[derive(Debug, Error, PartialEq)]
pub enum ReplyError {
    #[error("expected {expected}, got {reply}")]
    Unexpected {
        expected: &'static str,
        reply: JsonType,
    },

    #[error("pop reply has an odd number of elements ({0})")]
    OddLength(usize),

    #[error("invalid score {0:?}")]
    InvalidScore(String),

    #[error("pipeline of {expected} commands replied {got} values")]
    PipelineLength { expected: usize, got: usize },

    #[error("cannot encode reply: {0}")]
    Encode(String),
}

/// The reply of `set` with options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SetReply {
    /// Whether the value was written.
    Written(bool),
    /// The value before the write, asked for with `return_previous`.
    Previous(Option<String>),
}

fn unexpected(expected: &'static str, reply: &JsonType) -> ReplyError {
    ReplyError::Unexpected {
        expected,
        reply: reply.clone(),
    }
}

/// Normalizes a `zpopmax`/`zpopmin` reply into `(member, score)` pairs.
///
/// Accepts the flat alternating array and the `{}` an empty pop encodes as.
pub fn zpop_pairs(reply: &JsonType) -> Result<Vec<(String, f64)>, ReplyError> {
    let items = match reply {
        JsonType::Object(map) if map.is_empty() => return Ok(Vec::new()),
        JsonType::Array(items) => items,
        other => return Err(unexpected("array of members and scores", other)),
    };
    if items.len() % 2 != 0 {
        return Err(ReplyError::OddLength(items.len()));
    }
    items
        .chunks(2)
        .map(|pair| {
            let member = pair[0]
                .as_str()
                .ok_or_else(|| unexpected("member string", &pair[0]))?;
            let score = match &pair[1] {
                JsonType::String(s) => s
                    .parse::<f64>()
                    .map_err(|_| ReplyError::InvalidScore(s.clone()))?,
                JsonType::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| ReplyError::InvalidScore(n.to_string()))?,
                other => return Err(unexpected("score", other)),
            };
            Ok((member.to_string(), score))
        })
        .collect()
}

// Multi-bulk replies: `{}` when empty, `false` for some absent keys.
fn items(reply: JsonType, expected: &'static str) -> Result<Vec<JsonType>, ReplyError> {
    match reply {
        JsonType::Bool(false) => Ok(Vec::new()),
        JsonType::Object(map) if map.is_empty() => Ok(Vec::new()),
        JsonType::Array(items) => Ok(items),
        other => Err(unexpected(expected, &other)),
    }
}

fn string(item: JsonType) -> Result<String, ReplyError> {
    match item {
        JsonType::String(s) => Ok(s),
        other => Err(unexpected("string", &other)),
    }
}

/// The replies of a pipeline script, one per command.
pub(crate) fn reply_list(reply: JsonType, expected: usize) -> Result<Vec<JsonType>, ReplyError> {
    let replies = items(reply, "array of replies")?;
    if replies.len() != expected {
        return Err(ReplyError::PipelineLength {
            expected,
            got: replies.len(),
        });
    }
    Ok(replies)
}

/// A bulk reply, where `false` means the value is absent.
pub(crate) fn optional_string(reply: JsonType) -> Result<Option<String>, ReplyError> {
    match reply {
        JsonType::Bool(false) => Ok(None),
        JsonType::String(s) => Ok(Some(s)),
        other => Err(unexpected("string or false", &other)),
    }
}

/// A multi-bulk reply of strings. Absent keys and empty results give an
/// empty list.
pub(crate) fn string_list(reply: JsonType) -> Result<Vec<String>, ReplyError> {
    items(reply, "array of strings")?
        .into_iter()
        .map(string)
        .collect()
}

/// `hmget`: one value or `false` per requested field.
pub(crate) fn field_values(
    fields: &[String],
    reply: JsonType,
) -> Result<HashMap<String, Option<String>>, ReplyError> {
    let values = items(reply, "array of field values")?;
    if values.len() != fields.len() {
        return Err(unexpected("one value per field", &JsonType::Array(values)));
    }
    fields
        .iter()
        .cloned()
        .zip(values)
        .map(|(field, value)| Ok((field, optional_string(value)?)))
        .collect()
}

/// `hgetall`: a flat field/value array.
pub(crate) fn field_map(reply: JsonType) -> Result<HashMap<String, String>, ReplyError> {
    let items = items(reply, "array of fields and values")?;
    if items.len() % 2 != 0 {
        return Err(ReplyError::OddLength(items.len()));
    }
    let mut items = items.into_iter();
    let mut map = HashMap::new();
    while let (Some(field), Some(value)) = (items.next(), items.next()) {
        map.insert(string(field)?, string(value)?);
    }
    Ok(map)
}

/// An integer reply. Counters past 2^53 arrive as doubles and are taken
/// at that precision.
pub(crate) fn integer(reply: JsonType) -> Result<i64, ReplyError> {
    if let Some(n) = reply.as_i64() {
        return Ok(n);
    }
    match reply.as_f64() {
        Some(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => Ok(n as i64),
        _ => Err(unexpected("integer", &reply)),
    }
}

pub(crate) fn set_reply(return_previous: bool, reply: JsonType) -> Result<SetReply, ReplyError> {
    if return_previous {
        Ok(SetReply::Previous(optional_string(reply)?))
    } else {
        Ok(SetReply::Written(boolean(reply)?))
    }
}

pub(crate) fn boolean(reply: JsonType) -> Result<bool, ReplyError> {
    reply.as_bool().ok_or_else(|| unexpected("boolean", &reply))
}
