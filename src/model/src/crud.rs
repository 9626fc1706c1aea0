use std::collections::BTreeMap;

use dao::Dao;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{column_for, to_db_data, Model, ModelError, ModelResult, Table, Tablify};

/// Create/read/delete for one model type. Every instance created through
/// this handle is cached by identifier so `clear_cache` can remove it again.
pub struct ModelCrud<M: Model> {
    dao: Box<dyn Dao>,
    table: Table,
    instance_cache: BTreeMap<String, M>,
}

fn cache_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<M: Model> ModelCrud<M> {
    pub fn new(dao: Box<dyn Dao>) -> ModelResult<Self> {
        let table = Tablify::validate::<M>()?;
        Ok(ModelCrud {
            dao,
            table,
            instance_cache: BTreeMap::new(),
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn dao(&mut self) -> &mut dyn Dao {
        self.dao.as_mut()
    }

    pub fn cached(&self) -> impl Iterator<Item = &M> {
        self.instance_cache.values()
    }

    fn unique_value(instance: &M) -> ModelResult<Value> {
        instance
            .attributes()?
            .remove(M::UNIQUE_KEY)
            .filter(|v| !v.is_null())
            .ok_or(ModelError::MissingKey {
                model: M::model_name(),
                key: M::UNIQUE_KEY,
            })
    }

    /// Inserts `instance` and writes the generated identifier back into it.
    /// Returns a copy of the stored instance.
    pub fn create(&mut self, instance: &mut M) -> ModelResult<M> {
        let data = to_db_data(&*instance)?;
        if data.is_empty() {
            return Err(ModelError::EmptyInsert(M::model_name()));
        }

        let dialect = self.dao.dialect();
        let columns: Vec<String> = data.keys().map(|c| dialect.quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=data.len()).map(|i| dialect.placeholder(i)).collect();
        let id_column = column_for::<M>(M::ID_FIELD);
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            dialect.quote_ident(self.table.name),
            columns.join(", "),
            placeholders.join(", "),
            dialect.quote_ident(id_column),
        );
        let params: Vec<Value> = data.into_iter().map(|(_, value)| value).collect();

        let id = self
            .dao
            .trans_query(&sql, &params)?
            .into_iter()
            .next()
            .and_then(|mut row| row.remove(id_column))
            .filter(|id| !id.is_null());
        let Some(id) = id else {
            // the row is committed but cannot be cached by id
            warn!(table = self.table.name, "insert returned no identifier, removing the row");
            if let Err(err) = self.delete(instance) {
                warn!(table = self.table.name, %err, "could not remove the unidentified row");
            }
            return Err(ModelError::MissingIdentifier(self.table.name));
        };

        *instance = instance.with_attribute(M::ID_FIELD, id.clone())?;
        info!(table = self.table.name, id = %id, "created");
        self.instance_cache.insert(cache_key(&id), instance.clone());
        Ok(instance.clone())
    }

    /// Looks the instance up by its unique key.
    pub fn read(&mut self, instance: &M) -> ModelResult<Option<M>> {
        let key = Self::unique_value(instance)?;
        let dialect = self.dao.dialect();
        let columns: Vec<String> = self
            .table
            .columns
            .iter()
            .map(|c| dialect.quote_ident(c))
            .collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            columns.join(", "),
            dialect.quote_ident(self.table.name),
            dialect.quote_ident(column_for::<M>(M::UNIQUE_KEY)),
            dialect.placeholder(1),
        );

        let rows = self.dao.query(&sql, &[key])?;
        rows.first().map(M::from_row).transpose()
    }

    /// Deletes by unique key. The instance leaves the cache whether or not a
    /// row was actually removed.
    pub fn delete(&mut self, instance: &M) -> ModelResult<()> {
        let key = Self::unique_value(instance)?;
        let dialect = self.dao.dialect();
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            dialect.quote_ident(self.table.name),
            dialect.quote_ident(column_for::<M>(M::UNIQUE_KEY)),
            dialect.placeholder(1),
        );
        self.dao.trans(&sql, &[key.clone()])?;

        self.instance_cache
            .retain(|_, cached| Self::unique_value(cached).ok().as_ref() != Some(&key));
        debug!(table = self.table.name, %key, "deleted");
        Ok(())
    }

    /// Deletes every cached instance and returns how many were removed.
    /// Stops at the first failure; whatever was not deleted stays cached.
    pub fn clear_cache(&mut self) -> ModelResult<usize> {
        let pending: Vec<M> = self.instance_cache.values().cloned().collect();
        for instance in &pending {
            self.delete(instance)?;
        }
        if !pending.is_empty() {
            info!(table = self.table.name, count = pending.len(), "cache cleared");
        }
        Ok(pending.len())
    }
}
