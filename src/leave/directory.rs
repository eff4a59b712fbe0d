//! Employee directory and department registry collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};

use crate::error::{LeaveError, LeaveResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EmployeeRecord {
    pub id: u64,
    pub name: String,
    pub department: Option<String>,
    pub status: String,
    pub hire_date: NaiveDate,
}

impl EmployeeRecord {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Fails with `EmployeeNotFound` for unknown ids
    async fn get_employee(&self, employee_id: u64) -> LeaveResult<EmployeeRecord>;
}

#[async_trait]
pub trait DepartmentRegistry: Send + Sync {
    /// Department id for a name; `None` when nothing matches.
    async fn resolve(&self, name: &str) -> LeaveResult<Option<u64>>;
}

/// Fixed directory held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    employees: HashMap<u64, EmployeeRecord>,
    departments: HashMap<String, u64>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(mut self, employee: EmployeeRecord) -> Self {
        self.employees.insert(employee.id, employee);
        self
    }

    pub fn with_department(mut self, name: &str, id: u64) -> Self {
        self.departments.insert(name.to_lowercase(), id);
        self
    }
}

#[async_trait]
impl EmployeeDirectory for StaticDirectory {
    async fn get_employee(&self, employee_id: u64) -> LeaveResult<EmployeeRecord> {
        self.employees
            .get(&employee_id)
            .cloned()
            .ok_or(LeaveError::EmployeeNotFound(employee_id))
    }
}

#[async_trait]
impl DepartmentRegistry for StaticDirectory {
    async fn resolve(&self, name: &str) -> LeaveResult<Option<u64>> {
        Ok(self.departments.get(&name.trim().to_lowercase()).copied())
    }
}

/// Directory and registry over the HR database's `employees` and
/// `departments` tables
pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlDirectory {
    async fn get_employee(&self, employee_id: u64) -> LeaveResult<EmployeeRecord> {
        sqlx::query_as::<_, EmployeeRecord>(
            r#"
            SELECT
                e.id,
                CONCAT(e.first_name, ' ', e.last_name) AS name,
                d.name AS department,
                e.status,
                e.hire_date
            FROM employees e
            LEFT JOIN departments d ON d.id = e.department_id
            WHERE e.id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Employee lookup failed");
            LeaveError::Storage(e.to_string())
        })?
        .ok_or(LeaveError::EmployeeNotFound(employee_id))
    }
}

#[async_trait]
impl DepartmentRegistry for MySqlDirectory {
    async fn resolve(&self, name: &str) -> LeaveResult<Option<u64>> {
        sqlx::query_scalar::<_, u64>("SELECT id FROM departments WHERE name = ? LIMIT 1")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, department = name, "Department lookup failed");
                LeaveError::Storage(e.to_string())
            })
    }
}

/// Caches successful employee lookups for a fixed time-to-live
pub struct CachedDirectory {
    inner: Arc<dyn EmployeeDirectory>,
    cache: Cache<u64, EmployeeRecord>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn EmployeeDirectory>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(50_000).time_to_live(ttl).build(),
        }
    }

    pub async fn invalidate(&self, employee_id: u64) {
        self.cache.invalidate(&employee_id).await;
    }
}

#[async_trait]
impl EmployeeDirectory for CachedDirectory {
    async fn get_employee(&self, employee_id: u64) -> LeaveResult<EmployeeRecord> {
        if let Some(hit) = self.cache.get(&employee_id).await {
            return Ok(hit);
        }
        let employee = self.inner.get_employee(employee_id).await?;
        self.cache.insert(employee_id, employee.clone()).await;
        Ok(employee)
    }
}
