use serde::{de::Error, Deserialize, Deserializer};
use serde_json::Value;

/// SQLite has no boolean type and hands back `0`/`1`; some services answer
/// `"t"`/`"f"`. All of them read as `bool`.
pub fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().unwrap_or_default() != 0.0)),
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(Some(true)),
            "false" | "f" | "0" | "no" => Ok(Some(false)),
            other => Err(D::Error::custom(format!("not a boolean: {other}"))),
        },
        Some(other) => Err(D::Error::custom(format!("not a boolean: {other}"))),
    }
}
