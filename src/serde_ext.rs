//! Lenient deserializers for ids the web client sends either as numbers or
//! as numeric strings (`"12"`).

use serde::{Deserialize, Deserializer};

pub fn id<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("id {n} is not an integer"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("id `{s}` is not an integer"))),
        other => Err(serde::de::Error::custom(format!("unexpected id value {other}"))),
    }
}
