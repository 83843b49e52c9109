use crate::error::DecodeError;
use serde_json::Value;
use std::collections::HashMap;

/// One decoded JSON-lines log record: a mapping from string keys to
/// dynamically-typed JSON values. Only string-valued fields ever
/// participate in `FIND`.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    /// Decodes one JSON object. Fails with [`DecodeError`] if `line` is
    /// not valid JSON or is not a JSON object at the top level.
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(line)?;
        match value {
            Value::Object(map) => Ok(Record {
                fields: map.into_iter().collect(),
            }),
            other => {
                // Reuse serde_json's error machinery for a consistent
                // error type: re-parsing a non-object top level as the
                // concrete `Map` type produces the "invalid type" message.
                let err = serde_json::from_value::<serde_json::Map<String, Value>>(other)
                    .expect_err("non-object value must fail to decode as a map");
                Err(DecodeError(err))
            }
        }
    }

    /// The string value of `field`, or `None` if the field is absent or
    /// is not a JSON string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}
