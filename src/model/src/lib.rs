//! # Models
//!
//! A model is a plain serde struct plus an explicit schema: the list of
//! `(attribute, column)` pairs it persists, its identifier attribute, its
//! unique-key attribute and the attributes that never reach the database.
//! [`ModelCrud`] turns that declaration into parameterised SQL through a
//! [`dao::Dao`] and remembers what it created so a test can tear it down.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

mod crud;
mod de;
mod error;
mod gatekeeper;
mod screen_writer;
mod tablify;

pub use crud::ModelCrud;
pub use de::flexible_bool;
pub use error::{ModelError, ModelResult};
pub use gatekeeper::{latest_verification_code, Application, Group, Permission, User};
pub use screen_writer::Pack;
pub use tablify::{Table, Tablify};

/// Attribute (or column) name to value.
pub type Attributes = serde_json::Map<String, Value>;

/// One persisted attribute and the column it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub attribute: &'static str,
    pub column: &'static str,
}

impl Column {
    pub const fn new(attribute: &'static str, column: &'static str) -> Self {
        Column { attribute, column }
    }

    pub const fn same(name: &'static str) -> Self {
        Column {
            attribute: name,
            column: name,
        }
    }
}

pub trait Model: Serialize + DeserializeOwned + Default + Clone {
    const TABLE_NAME: &'static str;
    const ID_FIELD: &'static str;
    const UNIQUE_KEY: &'static str;
    const SCHEMA: &'static [Column];
    const DB_IGNORE: &'static [&'static str] = &[];

    fn model_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn attributes(&self) -> ModelResult<Attributes> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(ModelError::NotAnObject(Self::model_name())),
        }
    }

    /// Builds an instance from a result row keyed by column names. Columns
    /// outside the schema are ignored.
    fn from_row(row: &dao::Row) -> ModelResult<Self> {
        let mut attributes = Attributes::new();
        for column in Self::SCHEMA {
            if let Some(value) = row.get(column.column) {
                attributes.insert(column.attribute.to_string(), value.clone());
            }
        }
        Ok(serde_json::from_value(Value::Object(attributes))?)
    }

    fn with_attribute(&self, attribute: &str, value: Value) -> ModelResult<Self> {
        let mut attributes = self.attributes()?;
        attributes.insert(attribute.to_string(), value);
        Ok(serde_json::from_value(Value::Object(attributes))?)
    }
}

pub fn column_for<'a, M: Model>(attribute: &'a str) -> &'a str {
    M::SCHEMA
        .iter()
        .find(|c| c.attribute == attribute)
        .map(|c| c.column)
        .unwrap_or(attribute)
}

pub fn is_ignored<M: Model>(attribute: &str) -> bool {
    M::DB_IGNORE.contains(&attribute)
}

/// The persistable view of `instance`, keyed by column. Skips attributes
/// starting with `_`, null values and everything in `DB_IGNORE`.
pub fn to_db_data<M: Model>(instance: &M) -> ModelResult<Attributes> {
    let data = instance
        .attributes()?
        .into_iter()
        .filter(|(attribute, value)| {
            !attribute.starts_with('_') && !value.is_null() && !is_ignored::<M>(attribute)
        })
        .map(|(attribute, value)| (column_for::<M>(&attribute).to_string(), value))
        .collect();
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Device {
        device_id: Option<i64>,
        serial: Option<String>,
        secret: Option<String>,
        #[serde(rename = "_seen")]
        seen: Option<bool>,
    }

    impl Model for Device {
        const TABLE_NAME: &'static str = "courier_device";
        const ID_FIELD: &'static str = "device_id";
        const UNIQUE_KEY: &'static str = "serial";
        const SCHEMA: &'static [Column] = &[
            Column::new("device_id", "id"),
            Column::new("serial", "serial_number"),
            Column::same("secret"),
        ];
        const DB_IGNORE: &'static [&'static str] = &["secret"];
    }

    #[test]
    fn test_to_db_data_aliases_and_filters() {
        let device = Device {
            device_id: None,
            serial: Some("SN-1".to_string()),
            secret: Some("hunter2".to_string()),
            seen: Some(true),
        };
        let data = to_db_data(&device).unwrap();
        assert_eq!(Value::Object(data), json!({"serial_number": "SN-1"}));
    }

    #[test]
    fn test_from_row_maps_columns_back() {
        let row = json!({"id": 7, "serial_number": "SN-7", "extra": 1});
        let Value::Object(row) = row else { unreachable!() };
        let device = Device::from_row(&row).unwrap();
        assert_eq!(device.device_id, Some(7));
        assert_eq!(device.serial.as_deref(), Some("SN-7"));
        assert_eq!(device.secret, None);
    }

    #[test]
    fn test_with_attribute() {
        let device = Device::default().with_attribute("device_id", json!(3)).unwrap();
        assert_eq!(device.device_id, Some(3));
    }
}
