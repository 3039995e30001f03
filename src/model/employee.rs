use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub full_name: String,
    pub username: String,
    pub role: Role,
}
