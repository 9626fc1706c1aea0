use serde::{Deserialize, Serialize};

use crate::{flexible_bool, Column, Model};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pack {
    pub pack_id: Option<i64>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<i64>,
    pub owner_id: Option<i64>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_published: Option<bool>,
}

impl Pack {
    pub fn new(name: &str, title: &str) -> Self {
        Pack {
            name: Some(name.to_string()),
            title: Some(title.to_string()),
            version: Some(1),
            is_published: Some(false),
            ..Pack::default()
        }
    }
}

impl Model for Pack {
    const TABLE_NAME: &'static str = "core_pack";
    const ID_FIELD: &'static str = "pack_id";
    const UNIQUE_KEY: &'static str = "name";
    const SCHEMA: &'static [Column] = &[
        Column::new("pack_id", "id"),
        Column::same("name"),
        Column::same("title"),
        Column::same("description"),
        Column::same("version"),
        Column::same("owner_id"),
        Column::same("is_published"),
    ];
}
