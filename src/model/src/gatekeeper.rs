use dao::Dao;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{flexible_bool, Column, Model, ModelResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_superuser: Option<bool>,
    #[serde(deserialize_with = "flexible_bool")]
    pub two_factor_enabled: Option<bool>,
}

impl User {
    pub const LEVEL_ADMIN: &'static str = "admin";
    pub const LEVEL_STAFF: &'static str = "staff";
    pub const LEVEL_USER: &'static str = "user";

    pub fn new(username: &str, email: &str, password: &str) -> Self {
        User {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            is_active: Some(true),
            ..User::default()
        }
    }

    pub fn level(&self) -> &'static str {
        if self.is_superuser.unwrap_or(false) {
            Self::LEVEL_ADMIN
        } else {
            Self::LEVEL_USER
        }
    }
}

impl Model for User {
    const TABLE_NAME: &'static str = "auth_user";
    const ID_FIELD: &'static str = "user_id";
    const UNIQUE_KEY: &'static str = "username";
    const SCHEMA: &'static [Column] = &[
        Column::new("user_id", "id"),
        Column::same("username"),
        Column::same("email"),
        Column::same("first_name"),
        Column::same("last_name"),
        Column::same("password"),
        Column::new("phone", "phone_number"),
        Column::same("is_active"),
        Column::same("is_superuser"),
        Column::same("two_factor_enabled"),
    ];
    const DB_IGNORE: &'static [&'static str] = &["password"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub application_id: Option<i64>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub url: Option<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

impl Application {
    pub fn new(name: &str, url: &str) -> Self {
        Application {
            name: Some(name.to_string()),
            display_name: Some(name.to_string()),
            url: Some(url.to_string()),
            is_active: Some(true),
            ..Application::default()
        }
    }
}

impl Model for Application {
    const TABLE_NAME: &'static str = "gk_application";
    const ID_FIELD: &'static str = "application_id";
    const UNIQUE_KEY: &'static str = "name";
    const SCHEMA: &'static [Column] = &[
        Column::new("application_id", "id"),
        Column::same("name"),
        Column::same("display_name"),
        Column::same("url"),
        Column::same("is_active"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub group_id: Option<i64>,
    pub name: Option<String>,
    pub application_id: Option<i64>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Group {
            name: Some(name.to_string()),
            ..Group::default()
        }
    }
}

impl Model for Group {
    const TABLE_NAME: &'static str = "auth_group";
    const ID_FIELD: &'static str = "group_id";
    const UNIQUE_KEY: &'static str = "name";
    const SCHEMA: &'static [Column] = &[
        Column::new("group_id", "id"),
        Column::same("name"),
        Column::same("application_id"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    pub permission_id: Option<i64>,
    pub codename: Option<String>,
    pub name: Option<String>,
    pub application_id: Option<i64>,
}

impl Model for Permission {
    const TABLE_NAME: &'static str = "gk_permission";
    const ID_FIELD: &'static str = "permission_id";
    const UNIQUE_KEY: &'static str = "codename";
    const SCHEMA: &'static [Column] = &[
        Column::new("permission_id", "id"),
        Column::same("codename"),
        Column::same("name"),
        Column::same("application_id"),
    ];
}

/// Most recent two-factor verification code issued to `user_id`, as the
/// gatekeeper stored it.
pub fn latest_verification_code(dao: &mut dyn Dao, user_id: i64) -> ModelResult<Option<String>> {
    let dialect = dao.dialect();
    let sql = format!(
        "SELECT code FROM gk_verification_code WHERE user_id = {} ORDER BY created_at DESC, id DESC LIMIT 1",
        dialect.placeholder(1)
    );
    let code = dao
        .query(&sql, &[Value::from(user_id)])?
        .into_iter()
        .next()
        .and_then(|mut row| row.remove("code"))
        .and_then(|code| match code {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        });
    Ok(code)
}
