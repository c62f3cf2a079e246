use serde::{Deserialize, Deserializer};

use crate::serde_ext;

#[derive(Debug, Deserialize)]
pub struct LimitRequest {
    #[serde(deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
    #[serde(deserialize_with = "limit")]
    pub refer_limit: i32,
    #[serde(deserialize_with = "limit")]
    pub appointment_limit: i32,
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    #[serde(deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
    #[serde(deserialize_with = "flag")]
    pub block: bool,
}

fn limit<'de, D>(de: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_ext::id(de)?;
    i32::try_from(n).map_err(|_| serde::de::Error::custom(format!("limit {n} out of range")))
}

/// `true`/`false`, `1`/`0` or their string forms.
fn flag<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(de)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        serde_json::Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!("unexpected block flag `{other}`"))),
        },
        other => Err(serde::de::Error::custom(format!("unexpected block flag {other}"))),
    }
}
