//! Request lifecycle manager.
//!
//! Every operation is a read-compute-write cycle: load the request and the
//! balance, apply the transition and the ledger mutation to local copies,
//! then hand both to the store in one guarded write. A write that loses a
//! race is retried from a fresh read a bounded number of times.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::{LeaveError, LeaveResult};
use crate::leave::balance::{BalanceKey, LeaveBalance, Versioned};
use crate::leave::calendar::WorkingDayCalculator;
use crate::leave::catalog::{Catalog, LeaveTypeDefinition};
use crate::leave::directory::{DepartmentRegistry, EmployeeDirectory, EmployeeRecord};
use crate::leave::query::LeaveQueries;
use crate::leave::request::{Decision, LeaveApplication, LeaveRequest, LeaveRequestDraft, RequestId};
use crate::leave::store::{LeaveStore, StoreError};
use crate::leave::types::{Days, LeaveType};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of one attempt: retry on conflict, give up on anything else
enum Retry {
    Conflict(String),
    Fail(LeaveError),
}

impl From<LeaveError> for Retry {
    fn from(err: LeaveError) -> Self {
        Retry::Fail(err)
    }
}

impl From<StoreError> for Retry {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(reason) => Retry::Conflict(reason),
            other => Retry::Fail(other.into()),
        }
    }
}

#[derive(Clone)]
pub struct LeaveEngine {
    store: Arc<dyn LeaveStore>,
    directory: Arc<dyn EmployeeDirectory>,
    departments: Arc<dyn DepartmentRegistry>,
    catalog: Arc<Catalog>,
    calculator: WorkingDayCalculator,
    max_attempts: u32,
}

impl LeaveEngine {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        directory: Arc<dyn EmployeeDirectory>,
        departments: Arc<dyn DepartmentRegistry>,
        catalog: Catalog,
        calculator: WorkingDayCalculator,
    ) -> Self {
        Self {
            store,
            directory,
            departments,
            catalog: Arc::new(catalog),
            calculator,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read-only view over the same store
    pub fn queries(&self) -> LeaveQueries {
        LeaveQueries::new(self.store.clone(), self.calculator.clone())
    }

    /// Validate an application, reserve its days and store it as pending.
    #[instrument(name = "leave_submit", skip(self, application), fields(employee_id = ?application.employee_id))]
    pub async fn submit(&self, application: &LeaveApplication) -> LeaveResult<LeaveRequest> {
        let app = application.check()?;

        let duration = self
            .calculator
            .duration(app.start_date, app.end_date, app.half_day.is_some())?;
        if duration.is_zero() {
            return Err(LeaveError::validation("the requested dates contain no working days"));
        }

        let definition = self.catalog.lookup(app.leave_type)?;
        if definition.requires_certificate_for(duration) && !app.has_certificate {
            return Err(LeaveError::CertificateRequired {
                leave_type: app.leave_type,
                duration,
                kind: definition
                    .certificate_kind
                    .clone()
                    .unwrap_or_else(|| "supporting certificate".to_string()),
            });
        }

        let employee = self.active_employee(app.employee_id).await?;
        let department_id = match employee.department.as_deref() {
            Some(name) => self.departments.resolve(name).await?,
            None => None,
        };

        let draft = LeaveRequestDraft {
            employee_id: app.employee_id,
            employee_name: employee.name,
            department: employee.department,
            department_id,
            leave_type: app.leave_type,
            start_date: app.start_date,
            end_date: app.end_date,
            half_day: app.half_day,
            duration,
            reason: app.reason,
            has_certificate: app.has_certificate,
            submitted_at: Utc::now(),
        };

        let request = self.retrying("submit", || self.try_submit(&draft, definition)).await?;
        info!(
            request_id = %request.id,
            leave_type = %request.leave_type,
            duration = %request.duration,
            "Leave request submitted"
        );
        Ok(request)
    }

    async fn try_submit(&self, draft: &LeaveRequestDraft, definition: &LeaveTypeDefinition) -> Result<LeaveRequest, Retry> {
        let key = BalanceKey::new(draft.employee_id, draft.leave_type);
        let mut balance = match self.store.balance(key).await? {
            Some(stored) => stored,
            None => Versioned::unsaved(LeaveBalance::new(
                key.employee_id,
                key.leave_type,
                definition.days_per_year,
                Days::ZERO,
            )),
        };

        balance.value.reserve(draft.duration)?;
        Ok(self.store.insert_request(draft.clone(), &balance).await?)
    }

    #[instrument(name = "leave_approve", skip(self))]
    pub async fn approve(&self, id: RequestId, approver_id: u64) -> LeaveResult<LeaveRequest> {
        self.decide(id, Decision::Approve, approver_id).await
    }

    #[instrument(name = "leave_reject", skip(self, reason))]
    pub async fn reject(&self, id: RequestId, approver_id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.decide(
            id,
            Decision::Reject {
                reason: reason.to_string(),
            },
            approver_id,
        )
        .await
    }

    #[instrument(name = "leave_cancel", skip(self))]
    pub async fn cancel(&self, id: RequestId, actor_id: u64) -> LeaveResult<LeaveRequest> {
        self.decide(id, Decision::Cancel, actor_id).await
    }

    async fn decide(&self, id: RequestId, decision: Decision, actor: u64) -> LeaveResult<LeaveRequest> {
        let verb = decision.verb();
        let request = self
            .retrying(verb, || self.try_decide(id, &decision, actor))
            .await?;
        info!(request_id = %id, actor, status = %request.status(), "Leave request decided");
        Ok(request)
    }

    async fn try_decide(&self, id: RequestId, decision: &Decision, actor: u64) -> Result<LeaveRequest, Retry> {
        let mut request = self.store.request(id).await?.ok_or(LeaveError::NotFound(id))?;
        let next = request.state().decide(id, decision.clone(), actor, Utc::now())?;

        let mut balance = self.store.balance(request.balance_key()).await?.ok_or_else(|| {
            LeaveError::invariant(format!(
                "pending request {id} has no {} balance for employee {}",
                request.leave_type, request.employee_id
            ))
        })?;

        match decision {
            Decision::Approve => {
                let definition = self.catalog.lookup(request.leave_type)?;
                request.pay = Some(
                    definition
                        .pay_rate
                        .breakdown(balance.value.used(), request.duration),
                );
                balance.value.commit(request.duration)?;
            }
            Decision::Reject { .. } | Decision::Cancel => balance.value.release(request.duration)?,
        }
        request.state = next;

        self.store.record_decision(&request, &balance).await?;
        Ok(request)
    }

    /// Create a balance for a new accrual period, carrying over at most what
    /// the leave type's policy allows.
    #[instrument(name = "leave_enroll", skip(self))]
    pub async fn enroll(&self, employee_id: u64, leave_type: LeaveType, carry_over: Days) -> LeaveResult<LeaveBalance> {
        let definition = self.catalog.lookup(leave_type)?;
        self.active_employee(employee_id).await?;

        let carry_over = self.catalog.carry_over_for(leave_type, carry_over)?;
        let balance = LeaveBalance::new(employee_id, leave_type, definition.days_per_year, carry_over);

        match self.store.create_balance(&balance).await {
            Ok(_) => {
                info!(%carry_over, "Leave balance enrolled");
                Ok(balance)
            }
            Err(StoreError::Conflict(_)) => Err(LeaveError::validation(format!(
                "employee {employee_id} is already enrolled for {leave_type} leave"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn active_employee(&self, employee_id: u64) -> LeaveResult<EmployeeRecord> {
        let employee = self.directory.get_employee(employee_id).await?;
        if !employee.is_active() {
            return Err(LeaveError::validation(format!(
                "employee {} is not active ({})",
                employee.id, employee.status
            )));
        }
        Ok(employee)
    }

        async fn retrying<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> LeaveResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Retry>>,
    {
        for n in 1..=self.max_attempts {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(Retry::Fail(err)) => return Err(err),
                Err(Retry::Conflict(reason)) => {
                    warn!(operation, attempt = n, %reason, "Optimistic write conflict");
                }
            }
        }
        Err(LeaveError::Conflict {
            attempts: self.max_attempts,
        })
    }
}
