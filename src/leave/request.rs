//! Leave requests and their lifecycle.
//!
//! `pending` is the only state with outgoing transitions; `approved`,
//! `rejected` and `cancelled` are terminal.

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};

use crate::error::{LeaveError, LeaveResult};
use crate::leave::balance::BalanceKey;
use crate::leave::catalog::PayBreakdown;
use crate::leave::types::{Days, HalfDayPeriod, LeaveType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct RequestId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A decision taken on a pending request
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
    Cancel,
}

impl Decision {
    pub fn verb(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject { .. } => "reject",
            Decision::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Approved {
        decided_by: u64,
        decided_at: DateTime<Utc>,
    },
    Rejected {
        decided_by: u64,
        decided_at: DateTime<Utc>,
        reason: String,
    },
    Cancelled {
        decided_by: u64,
        decided_at: DateTime<Utc>,
    },
}

impl RequestState {
    pub fn status(&self) -> LeaveStatus {
        match self {
            RequestState::Pending => LeaveStatus::Pending,
            RequestState::Approved { .. } => LeaveStatus::Approved,
            RequestState::Rejected { .. } => LeaveStatus::Rejected,
            RequestState::Cancelled { .. } => LeaveStatus::Cancelled,
        }
    }

    pub fn decided_by(&self) -> Option<u64> {
        match self {
            RequestState::Pending => None,
            RequestState::Approved { decided_by, .. }
            | RequestState::Rejected { decided_by, .. }
            | RequestState::Cancelled { decided_by, .. } => Some(*decided_by),
        }
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RequestState::Pending => None,
            RequestState::Approved { decided_at, .. }
            | RequestState::Rejected { decided_at, .. }
            | RequestState::Cancelled { decided_at, .. } => Some(*decided_at),
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            RequestState::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Next state for `decision`; only a pending request accepts one.
    pub fn decide(&self, id: RequestId, decision: Decision, actor: u64, at: DateTime<Utc>) -> LeaveResult<RequestState> {
        if *self != RequestState::Pending {
            return Err(LeaveError::InvalidTransition {
                id,
                from: self.status(),
                action: decision.verb(),
            });
        }

        Ok(match decision {
            Decision::Approve => RequestState::Approved {
                decided_by: actor,
                decided_at: at,
            },
            Decision::Reject { reason } => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(LeaveError::validation("a rejection reason is required"));
                }
                RequestState::Rejected {
                    decided_by: actor,
                    decided_at: at,
                    reason: reason.to_string(),
                }
            }
            Decision::Cancel => RequestState::Cancelled {
                decided_by: actor,
                decided_at: at,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveRequest {
    pub id: RequestId,
    pub employee_id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub department_id: Option<u64>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day: Option<HalfDayPeriod>,
    pub duration: Days,
    pub reason: String,
    pub has_certificate: bool,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub(crate) state: RequestState,
    /// Pay bands the days were charged to, known once approved
    pub pay: Option<PayBreakdown>,
}

impl LeaveRequest {
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn status(&self) -> LeaveStatus {
        self.state.status()
    }

    pub fn balance_key(&self) -> BalanceKey {
        BalanceKey::new(self.employee_id, self.leave_type)
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Active requests hold or consume balance
    pub fn is_active(&self) -> bool {
        matches!(self.status(), LeaveStatus::Pending | LeaveStatus::Approved)
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate, half_day: Option<HalfDayPeriod>) -> bool {
        periods_overlap((self.start_date, self.end_date, self.half_day), (start, end, half_day))
    }
}

/// Date ranges intersect; two half-days on the same date in different
/// periods do not.
pub fn periods_overlap(
    a: (NaiveDate, NaiveDate, Option<HalfDayPeriod>),
    b: (NaiveDate, NaiveDate, Option<HalfDayPeriod>),
) -> bool {
    if a.0 > b.1 || b.0 > a.1 {
        return false;
    }
    match (a.2, b.2) {
        (Some(first), Some(second)) => first == second,
        _ => true,
    }
}

/// A validated request waiting for an id
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequestDraft {
    pub employee_id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub department_id: Option<u64>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day: Option<HalfDayPeriod>,
    pub duration: Days,
    pub reason: String,
    pub has_certificate: bool,
    pub submitted_at: DateTime<Utc>,
}

impl LeaveRequestDraft {
    pub fn into_request(self, id: RequestId) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            department: self.department,
            department_id: self.department_id,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            half_day: self.half_day,
            duration: self.duration,
            reason: self.reason,
            has_certificate: self.has_certificate,
            submitted_at: self.submitted_at,
            state: RequestState::Pending,
            pay: None,
        }
    }
}

/// Candidate request as submitted by a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveApplication {
    pub employee_id: Option<u64>,
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub half_day: bool,
    pub half_day_period: Option<HalfDayPeriod>,
    pub reason: Option<String>,
    #[serde(default)]
    pub has_certificate: bool,
}

/// Application with every required field present
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CheckedApplication {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day: Option<HalfDayPeriod>,
    pub reason: String,
    pub has_certificate: bool,
}

impl LeaveApplication {
    pub(crate) fn check(&self) -> LeaveResult<CheckedApplication> {
        let mut missing = Vec::new();
        if self.employee_id.is_none() {
            missing.push("employee_id");
        }
        if self.leave_type.is_none() {
            missing.push("leave_type");
        }
        if self.start_date.is_none() {
            missing.push("start_date");
        }
        if self.end_date.is_none() {
            missing.push("end_date");
        }
        let reason = self.reason.as_deref().map(str::trim).unwrap_or_default();
        if reason.is_empty() {
            missing.push("reason");
        }

        let (Some(employee_id), Some(leave_type), Some(start_date), Some(end_date)) =
            (self.employee_id, self.leave_type, self.start_date, self.end_date)
        else {
            return Err(LeaveError::validation(format!("missing required fields: {}", missing.join(", "))));
        };
        if !missing.is_empty() {
            return Err(LeaveError::validation(format!("missing required fields: {}", missing.join(", "))));
        }

        let half_day = match (self.half_day, self.half_day_period) {
            (true, Some(period)) => Some(period),
            (true, None) => return Err(LeaveError::validation("half_day_period is required for a half-day request")),
            (false, Some(_)) => {
                return Err(LeaveError::validation("half_day_period is only allowed on a half-day request"));
            }
            (false, None) => None,
        };

        if start_date > end_date {
            return Err(LeaveError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        Ok(CheckedApplication {
            employee_id,
            leave_type,
            start_date,
            end_date,
            half_day,
            reason: reason.to_string(),
            has_certificate: self.has_certificate,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub employee_id: Option<u64>,
    pub department_id: Option<u64>,
    pub leave_type: Option<LeaveType>,
    pub status: Option<LeaveStatus>,
    /// Requests whose range contains this date
    pub on_date: Option<NaiveDate>,
    /// Requests intersecting `from..=to`
    pub overlapping: Option<(NaiveDate, NaiveDate)>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl RequestFilter {
    pub fn for_employee(employee_id: u64) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: LeaveStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.on_date = Some(date);
        self
    }

    pub fn page(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Field criteria only; paging is applied by the store.
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| request.employee_id == id)
            && self.department_id.is_none_or(|id| request.department_id == Some(id))
            && self.leave_type.is_none_or(|t| request.leave_type == t)
            && self.status.is_none_or(|s| request.status() == s)
            && self.on_date.is_none_or(|d| request.covers(d))
            && self
                .overlapping
                .is_none_or(|(from, to)| request.start_date <= to && from <= request.end_date)
    }
}
