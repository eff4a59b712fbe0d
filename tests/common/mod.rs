#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use hrm_leave::leave::{
    Catalog, EmployeeRecord, LeaveApplication, LeaveEngine, LeaveType, MemoryLeaveStore, StaticDirectory,
    WorkingDayCalculator,
};

pub const ADA: u64 = 1;
pub const GRACE: u64 = 2;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn directory() -> StaticDirectory {
    let employee = |id: u64, name: &str| EmployeeRecord {
        id,
        name: name.to_string(),
        department: Some("Finance".to_string()),
        status: "active".to_string(),
        hire_date: date(2023, 4, 3),
    };
    StaticDirectory::new()
        .with_employee(employee(ADA, "Ada Lovelace"))
        .with_employee(employee(GRACE, "Grace Hopper"))
        .with_department("Finance", 7)
}

pub fn engine_with_catalog(catalog: Catalog) -> (LeaveEngine, MemoryLeaveStore) {
    let store = MemoryLeaveStore::new();
    let directory = Arc::new(directory());
    let engine = LeaveEngine::new(
        Arc::new(store.clone()),
        directory.clone(),
        directory,
        catalog,
        WorkingDayCalculator::default(),
    );
    (engine, store)
}

pub fn engine() -> (LeaveEngine, MemoryLeaveStore) {
    engine_with_catalog(Catalog::standard())
}

pub fn application(employee_id: u64, leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveApplication {
    LeaveApplication {
        employee_id: Some(employee_id),
        leave_type: Some(leave_type),
        start_date: Some(start),
        end_date: Some(end),
        reason: Some("time off".to_string()),
        ..LeaveApplication::default()
    }
}
