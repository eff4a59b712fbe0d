//! Error taxonomy of the leave engine.

use chrono::NaiveDate;
use thiserror::Error;

use crate::leave::request::{LeaveStatus, RequestId};
use crate::leave::types::{Days, LeaveType};

pub type LeaveResult<T> = Result<T, LeaveError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeaveError {
    /// Malformed or incomplete input
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("a half-day request must start and end on the same date (got {start} to {end})")]
    InvalidHalfDayRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown leave type: {0}")]
    UnknownLeaveType(String),

    #[error("employee {0} not found")]
    EmployeeNotFound(u64),

    #[error("employee {employee_id} has no {leave_type} balance")]
    NoBalanceRecord {
        employee_id: u64,
        leave_type: LeaveType,
    },

    #[error("{leave_type} leave of {duration} days requires a {kind}")]
    CertificateRequired {
        leave_type: LeaveType,
        duration: Days,
        kind: String,
    },

    #[error("insufficient balance: requested {requested} days, {remaining} remaining")]
    InsufficientBalance { requested: Days, remaining: Days },

    #[error("cannot {action} leave request {id} in status {from}")]
    InvalidTransition {
        id: RequestId,
        from: LeaveStatus,
        action: &'static str,
    },

    /// Internal defensive check failed; a lifecycle bug, not a user error
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("leave request {0} not found")]
    NotFound(RequestId),

    #[error("concurrent modification, gave up after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl LeaveError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Raise an invariant violation and log it at error level.
    pub fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(invariant = %msg, "leave ledger invariant violated");
        Self::InvariantViolation(msg)
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidHalfDayRange { .. } => "invalid_half_day_range",
            Self::UnknownLeaveType(_) => "unknown_leave_type",
            Self::EmployeeNotFound(_) => "employee_not_found",
            Self::NoBalanceRecord { .. } => "no_balance_record",
            Self::CertificateRequired { .. } => "certificate_required",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::NotFound(_) => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Storage(_) => "storage_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct_for_invariant_and_validation() {
        let invariant = LeaveError::invariant("pending would go negative");
        let validation = LeaveError::validation("reason is required");

        assert_eq!(invariant.kind(), "invariant_violation");
        assert_eq!(validation.kind(), "validation_error");
        assert_ne!(invariant.kind(), validation.kind());
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = LeaveError::InsufficientBalance {
            requested: Days::whole(3),
            remaining: Days::from_halves(3),
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: requested 3 days, 1.5 remaining"
        );
    }
}
