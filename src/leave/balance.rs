//! Per-employee, per-type leave ledger.
//!
//! Mutations are check-then-act: every operation validates that the ledger
//! stays consistent before touching any field, so a failed call leaves the
//! record exactly as it was. Persistence is the store's job; the lifecycle
//! manager writes the mutated record back together with the request that
//! caused it.

use serde::{Deserialize, Serialize};

use crate::error::{LeaveError, LeaveResult};
use crate::leave::types::{Days, LeaveType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    pub employee_id: u64,
    pub leave_type: LeaveType,
}

impl BalanceKey {
    pub fn new(employee_id: u64, leave_type: LeaveType) -> Self {
        Self {
            employee_id,
            leave_type,
        }
    }
}

/// Record version used for optimistic concurrency; 0 means "not stored yet".
pub type Version = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: Version) -> Self {
        Self { value, version }
    }

    /// A value that has never been written
    pub fn unsaved(value: T) -> Self {
        Self::new(value, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    employee_id: u64,
    leave_type: LeaveType,
    entitled: Days,
    used: Days,
    pending: Days,
    carry_over: Days,
}

impl LeaveBalance {
    pub fn new(employee_id: u64, leave_type: LeaveType, entitled: Days, carry_over: Days) -> Self {
        Self {
            employee_id,
            leave_type,
            entitled,
            used: Days::ZERO,
            pending: Days::ZERO,
            carry_over,
        }
    }

    /// Rebuild a stored record, refusing one whose `used + pending` exceeds
    /// what is available.
    pub(crate) fn restore(
        key: BalanceKey,
        entitled: Days,
        used: Days,
        pending: Days,
        carry_over: Days,
    ) -> LeaveResult<Self> {
        if used + pending > entitled + carry_over {
            return Err(LeaveError::invariant(format!(
                "stored {} balance of employee {} is overdrawn",
                key.leave_type, key.employee_id
            )));
        }
        Ok(Self {
            employee_id: key.employee_id,
            leave_type: key.leave_type,
            entitled,
            used,
            pending,
            carry_over,
        })
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey::new(self.employee_id, self.leave_type)
    }

    pub fn employee_id(&self) -> u64 {
        self.employee_id
    }

    pub fn leave_type(&self) -> LeaveType {
        self.leave_type
    }

    pub fn entitled(&self) -> Days {
        self.entitled
    }

    pub fn used(&self) -> Days {
        self.used
    }

    pub fn pending(&self) -> Days {
        self.pending
    }

    pub fn carry_over(&self) -> Days {
        self.carry_over
    }

    /// `entitled + carry_over - used - pending`, never stored
    pub fn remaining(&self) -> Days {
        (self.entitled + self.carry_over).saturating_sub(self.used + self.pending)
    }

    /// Hold `days` against the balance for a request awaiting a decision.
    pub(crate) fn reserve(&mut self, days: Days) -> LeaveResult<()> {
        let remaining = self.remaining();
        if days > remaining {
            return Err(LeaveError::InsufficientBalance {
                requested: days,
                remaining,
            });
        }
        self.pending += days;
        Ok(())
    }

    /// Move `days` from pending to used.
    pub(crate) fn commit(&mut self, days: Days) -> LeaveResult<()> {
        let pending = self.pending.checked_sub(days).ok_or_else(|| {
            LeaveError::invariant(format!(
                "commit of {days} days exceeds {} pending on employee {} {} balance",
                self.pending, self.employee_id, self.leave_type
            ))
        })?;
        self.pending = pending;
        self.used += days;
        Ok(())
    }

    /// Drop `days` from pending without charging them.
    pub(crate) fn release(&mut self, days: Days) -> LeaveResult<()> {
        self.pending = self.pending.checked_sub(days).ok_or_else(|| {
            LeaveError::invariant(format!(
                "release of {days} days exceeds {} pending on employee {} {} balance",
                self.pending, self.employee_id, self.leave_type
            ))
        })?;
        Ok(())
    }
}
