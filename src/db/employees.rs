use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{Result, WorktimeError};
use crate::model::{Employee, NewEmployee, Role};

const EMPLOYEE_COLUMNS: &str = "id, full_name, username, role";

pub async fn find_employee(conn: &mut SqliteConnection, id: i64) -> Result<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(employee)
}

/// Directory lookup; an unknown id is a `NotFound`.
pub async fn get_employee(conn: &mut SqliteConnection, id: i64) -> Result<Employee> {
    find_employee(conn, id)
        .await?
        .ok_or_else(|| WorktimeError::not_found(format!("employee {id}")))
}

pub async fn list_employees(conn: &mut SqliteConnection) -> Result<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id"
    ))
    .fetch_all(conn)
    .await?;

    Ok(employees)
}

pub async fn list_employee_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM employees ORDER BY id")
        .fetch_all(conn)
        .await?;

    Ok(ids)
}

pub async fn list_by_role(conn: &mut SqliteConnection, role: Role) -> Result<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE role = ? ORDER BY id"
    ))
    .bind(role)
    .fetch_all(conn)
    .await?;

    Ok(employees)
}

pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = ?"
    ))
    .bind(username.trim().to_lowercase())
    .fetch_optional(conn)
    .await?;

    Ok(employee)
}

/// Usernames are stored lowercased and must be unique.
pub async fn create_employee(
    conn: &mut SqliteConnection,
    new_employee: &NewEmployee,
) -> Result<Employee> {
    let username = new_employee.username.trim().to_lowercase();
    let full_name = new_employee.full_name.trim();

    if username.is_empty() || full_name.is_empty() {
        return Err(WorktimeError::invalid(
            "full name and username must not be empty",
        ));
    }

    if find_by_username(&mut *conn, &username).await?.is_some() {
        return Err(WorktimeError::invalid(format!(
            "username {username} already taken"
        )));
    }

    let id = sqlx::query("INSERT INTO employees (full_name, username, role) VALUES (?, ?, ?)")
        .bind(full_name)
        .bind(&username)
        .bind(new_employee.role)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    debug!(employee_id = id, %username, "Employee created");

    get_employee(conn, id).await
}
