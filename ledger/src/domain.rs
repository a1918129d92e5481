use bytes::Bytes;
use shared::{Error, Result};

/// A value a caller can store, reduced to a canonical byte encoding before
/// it is written. The store retains no type information; reading a value
/// back in its original type requires the matching decoder.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

impl TypedValue {
    /// Canonical byte encoding: integers and floats render to decimal text
    /// then UTF-8, text encodes directly, raw bytes pass through unchanged.
    pub fn encode(&self) -> Bytes {
        match self {
            TypedValue::Bytes(raw) => Bytes::copy_from_slice(raw),
            other => Bytes::from(other.render()),
        }
    }

    /// Text form recorded in call histories and printed by replay.
    pub fn render(&self) -> String {
        match self {
            TypedValue::Text(text) => text.clone(),
            TypedValue::Bytes(raw) => String::from_utf8_lossy(raw).into_owned(),
            TypedValue::Int(n) => n.to_string(),
            TypedValue::Float(x) => x.to_string(),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Text(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::Text(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        TypedValue::Bytes(value)
    }
}

impl From<&[u8]> for TypedValue {
    fn from(value: &[u8]) -> Self {
        TypedValue::Bytes(value.to_vec())
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Int(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::Float(value)
    }
}

/// Decode stored bytes as UTF-8 text.
pub fn decode_text(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec()).map_err(|e| Error::Decode(format!("invalid utf-8: {e}")))
}

/// Decode stored bytes as decimal integer text.
pub fn decode_int(raw: &[u8]) -> Result<i64> {
    decode_text(raw)?
        .parse()
        .map_err(|e| Error::Decode(format!("not a decimal integer: {e}")))
}

/// Decode stored bytes as decimal floating-point text.
pub fn decode_float(raw: &[u8]) -> Result<f64> {
    decode_text(raw)?
        .parse()
        .map_err(|e| Error::Decode(format!("not a decimal float: {e}")))
}

/// A fixed, human-chosen name for a tracked operation. The name doubles as
/// the counter key; the input and output histories hang off it with fixed
/// suffixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationId(&'static str);

impl OperationId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }

    pub const fn counter_key(&self) -> &'static str {
        self.0
    }

    pub fn inputs_key(&self) -> String {
        format!("{}:inputs", self.0)
    }

    pub fn outputs_key(&self) -> String {
        format!("{}:outputs", self.0)
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// The tracked operations, named once at design time.
pub mod ops {
    use super::OperationId;

    pub const CACHE_STORE: OperationId = OperationId::new("Cache.store");
}
