//! Leave entitlement and approval engine.

pub mod balance;
pub mod calendar;
pub mod catalog;
pub mod directory;
pub mod engine;
pub mod query;
pub mod request;
pub mod store;
pub mod types;

pub use balance::{BalanceKey, LeaveBalance};
pub use calendar::{HolidaySet, WorkingDayCalculator};
pub use catalog::{Catalog, LeaveTypeDefinition, PayBreakdown, PayRate};
pub use directory::{CachedDirectory, EmployeeRecord, MySqlDirectory, StaticDirectory};
pub use engine::LeaveEngine;
pub use query::{LeaveQueries, UsageLine};
pub use request::{LeaveApplication, LeaveRequest, LeaveStatus, RequestFilter, RequestId};
pub use store::{LeaveStore, MemoryLeaveStore, MySqlLeaveStore};
pub use types::{Days, HalfDayPeriod, LeaveType};
