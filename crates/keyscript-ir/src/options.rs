//! Options of the `set` command.
//!
//! Options travel as a literal object operand, e.g.
//! `["set", ["key", "k"], "v", {"mode": "if_missing", "expire_in": 1.5}]`.
//! They decide the reply shape, so they must be known at compile time.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::{CommandObj, ExprObj, JsonType, MAX_EXACT_INTEGER, Opcode, ValidationError};

/// When `set` writes the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMode {
    #[default]
    Always,
    /// Only if the key does not exist (`NX`)
    IfMissing,
    /// Only if the key exists (`XX`)
    IfExists,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetOptions {
    pub mode: SetMode,
    /// Reply the previous value (or `false`) instead of whether the value
    /// was written.
    pub return_previous: bool,
    /// Expire after this many seconds. Millisecond precision.
    pub expire_in: Option<f64>,
    /// Expire at this time, in milliseconds since the Unix epoch.
    pub expire_timestamp: Option<u64>,
    /// Keep the expiry the key already has.
    pub keep_ttl: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: SetMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn return_previous(mut self) -> Self {
        self.return_previous = true;
        self
    }

    pub fn expire_in(mut self, seconds: f64) -> Self {
        self.expire_in = Some(seconds);
        self
    }

    /// Expire at `at`. Times before the epoch clamp to it.
    pub fn expire_at(mut self, at: SystemTime) -> Self {
        let millis = at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        self.expire_timestamp = Some(millis);
        self
    }

    pub fn keep_ttl(mut self) -> Self {
        self.keep_ttl = true;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Reads options from a literal operand.
    pub fn from_literal(value: &JsonType) -> Result<Self, String> {
        let options: SetOptions =
            serde_json::from_value(value.clone()).map_err(|err| err.to_string())?;
        options.check()?;
        Ok(options)
    }

    fn check(&self) -> Result<(), String> {
        let expiries = [
            self.expire_in.is_some(),
            self.expire_timestamp.is_some(),
            self.keep_ttl,
        ];
        if expiries.iter().filter(|given| **given).count() > 1 {
            return Err("only one expiry option may be given".to_string());
        }
        if let Some(seconds) = self.expire_in {
            if !seconds.is_finite() || expire_millis(seconds) < 1 {
                return Err(format!("expire_in must be at least a millisecond, got {seconds}"));
            }
        }
        if let Some(at) = self.expire_timestamp {
            if at == 0 || at > MAX_EXACT_INTEGER {
                return Err(format!("expire_timestamp out of range: {at}"));
            }
        }
        Ok(())
    }

    /// The literal operand form. Default fields are left out.
    pub fn to_literal(&self) -> JsonType {
        let mut map = Map::new();
        if self.mode != SetMode::Always {
            let mode = match self.mode {
                SetMode::IfMissing => "if_missing",
                _ => "if_exists",
            };
            map.insert("mode".into(), mode.into());
        }
        if self.return_previous {
            map.insert("return_previous".into(), true.into());
        }
        if let Some(seconds) = self.expire_in {
            map.insert("expire_in".into(), seconds.into());
        }
        if let Some(at) = self.expire_timestamp {
            map.insert("expire_timestamp".into(), at.into());
        }
        if self.keep_ttl {
            map.insert("keep_ttl".into(), true.into());
        }
        JsonType::Object(map)
    }

    /// The flags appended to the `set` command, e.g. `["NX", "GET", "PX", "1500"]`.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        match self.mode {
            SetMode::Always => {}
            SetMode::IfMissing => flags.push("NX".to_string()),
            SetMode::IfExists => flags.push("XX".to_string()),
        }
        if self.return_previous {
            flags.push("GET".to_string());
        }
        if let Some(seconds) = self.expire_in {
            flags.push("PX".to_string());
            flags.push(expire_millis(seconds).to_string());
        } else if let Some(at) = self.expire_timestamp {
            flags.push("PXAT".to_string());
            flags.push(at.to_string());
        } else if self.keep_ttl {
            flags.push("KEEPTTL".to_string());
        }
        flags
    }
}

// Truncates like an integer cast of the millisecond count.
fn expire_millis(seconds: f64) -> i64 {
    (seconds * 1000.0) as i64
}

impl CommandObj {
    /// Splits off the options operand of `set`. Other commands carry no
    /// options and return all their operands.
    pub fn split_options(&self) -> Result<(&[ExprObj], SetOptions), ValidationError> {
        match (self.op, self.args.as_slice()) {
            (Opcode::Set, [operands @ .., options]) if self.args.len() == 3 => {
                let invalid = |reason: String| ValidationError::InvalidOptions {
                    opcode: self.op.to_string(),
                    reason,
                };
                let literal = options
                    .as_literal()
                    .ok_or_else(|| invalid("options must be a literal".to_string()))?;
                Ok((operands, SetOptions::from_literal(literal).map_err(invalid)?))
            }
            _ => Ok((&self.args, SetOptions::default())),
        }
    }
}
