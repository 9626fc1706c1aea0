use crate::{is_ignored, Model, ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
}

/// Derives table descriptions from model declarations.
pub struct Tablify;

impl Tablify {
    pub fn get_table<M: Model>() -> Table {
        Table {
            name: M::TABLE_NAME,
            columns: M::SCHEMA
                .iter()
                .filter(|c| !is_ignored::<M>(c.attribute))
                .map(|c| c.column)
                .collect(),
        }
    }

    /// Rejects declarations a CRUD layer cannot work with.
    pub fn validate<M: Model>() -> ModelResult<Table> {
        let invalid = |reason: String| ModelError::InvalidModel {
            model: M::model_name(),
            reason,
        };
        if M::TABLE_NAME.trim().is_empty() {
            return Err(invalid("no table name".to_string()));
        }
        for (role, attribute) in [("identifier", M::ID_FIELD), ("unique key", M::UNIQUE_KEY)] {
            if !M::SCHEMA.iter().any(|c| c.attribute == attribute) {
                return Err(invalid(format!("{role} '{attribute}' is not in the schema")));
            }
            if is_ignored::<M>(attribute) {
                return Err(invalid(format!("{role} '{attribute}' is never persisted")));
            }
        }

        let table = Self::get_table::<M>();
        if table.columns.is_empty() {
            return Err(invalid("no persisted columns".to_string()));
        }
        Ok(table)
    }
}
