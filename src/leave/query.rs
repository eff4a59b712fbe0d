//! Read-only views over requests and balances. Nothing here mutates state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{LeaveError, LeaveResult};
use crate::leave::balance::{BalanceKey, LeaveBalance};
use crate::leave::calendar::WorkingDayCalculator;
use crate::leave::request::{LeaveRequest, LeaveStatus, RequestFilter, RequestId};
use crate::leave::store::LeaveStore;
use crate::leave::types::{Days, LeaveType};

/// Approved days of one leave type within a reporting window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageLine {
    pub leave_type: LeaveType,
    pub days: Days,
    pub requests: u32,
}

#[derive(Clone)]
pub struct LeaveQueries {
    store: Arc<dyn LeaveStore>,
    calculator: WorkingDayCalculator,
}

impl LeaveQueries {
    pub fn new(store: Arc<dyn LeaveStore>, calculator: WorkingDayCalculator) -> Self {
        Self { store, calculator }
    }

    pub async fn list_requests(&self, filter: &RequestFilter) -> LeaveResult<Vec<LeaveRequest>> {
        Ok(self.store.list_requests(filter).await?)
    }

    pub async fn count_requests(&self, filter: &RequestFilter) -> LeaveResult<u64> {
        Ok(self.store.count_requests(filter).await?)
    }

    pub async fn get_request(&self, id: RequestId) -> LeaveResult<LeaveRequest> {
        self.store.request(id).await?.ok_or(LeaveError::NotFound(id))
    }

    /// Stored balance; an employee never enrolled for the type has none.
    pub async fn get_balance(&self, employee_id: u64, leave_type: LeaveType) -> LeaveResult<LeaveBalance> {
        self.store
            .balance(BalanceKey::new(employee_id, leave_type))
            .await?
            .map(|stored| stored.value)
            .ok_or(LeaveError::NoBalanceRecord {
                employee_id,
                leave_type,
            })
    }

    /// True when an approved request of the employee covers `date`
    pub async fn is_on_leave(&self, employee_id: u64, date: NaiveDate) -> LeaveResult<bool> {
        let filter = RequestFilter::for_employee(employee_id)
            .with_status(LeaveStatus::Approved)
            .on(date);
        Ok(self.store.count_requests(&filter).await? > 0)
    }

    /// Approved requests covering `date`, across all employees
    pub async fn on_leave(&self, date: NaiveDate) -> LeaveResult<Vec<LeaveRequest>> {
        let filter = RequestFilter::default()
            .with_status(LeaveStatus::Approved)
            .on(date);
        self.list_requests(&filter).await
    }

    /// Approved working days per leave type for a department, counting only
    /// the part of each request inside `from..=to`.
    pub async fn department_usage(
        &self,
        department_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LeaveResult<Vec<UsageLine>> {
        if from > to {
            return Err(LeaveError::InvalidRange { start: from, end: to });
        }

        let filter = RequestFilter {
            department_id: Some(department_id),
            status: Some(LeaveStatus::Approved),
            overlapping: Some((from, to)),
            ..RequestFilter::default()
        };

        let mut totals: BTreeMap<LeaveType, (Days, u32)> = BTreeMap::new();
        for request in self.store.list_requests(&filter).await? {
            let days = if request.half_day.is_some() {
                Days::HALF
            } else {
                self.calculator
                    .duration(request.start_date.max(from), request.end_date.min(to), false)?
            };
            let entry = totals.entry(request.leave_type).or_default();
            entry.0 += days;
            entry.1 += 1;
        }

        Ok(totals
            .into_iter()
            .map(|(leave_type, (days, requests))| UsageLine {
                leave_type,
                days,
                requests,
            })
            .collect())
    }
}
