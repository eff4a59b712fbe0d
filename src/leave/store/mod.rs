//! Persistence for balances and requests.
//!
//! Balance records are versioned. Every write names the version it was
//! computed from and fails with [`StoreError::Conflict`] when the stored
//! record has moved on, so the caller can re-read and retry. The two
//! multi-record writes (`insert_request`, `record_decision`) are applied as
//! one unit or not at all.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::LeaveError;
use crate::leave::balance::{BalanceKey, LeaveBalance, Version, Versioned};
use crate::leave::request::{LeaveRequest, LeaveRequestDraft, RequestFilter, RequestId};

pub mod memory;
pub mod mysql;

pub use memory::MemoryLeaveStore;
pub use mysql::MySqlLeaveStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Concurrent modification detected by a version or status guard
    #[error("conflict: {0}")]
    Conflict(String),

    /// The new request overlaps an active request of the same employee
    #[error("overlaps leave request {0}")]
    Overlap(RequestId),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<StoreError> for LeaveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overlap(id) => {
                LeaveError::validation(format!("the requested dates overlap leave request {id}"))
            }
            StoreError::Conflict(msg) | StoreError::Database(msg) => LeaveError::Storage(msg),
        }
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn balance(&self, key: BalanceKey) -> StoreResult<Option<Versioned<LeaveBalance>>>;

    /// Store a brand-new balance; conflicts when one already exists.
    async fn create_balance(&self, balance: &LeaveBalance) -> StoreResult<Version>;

    async fn request(&self, id: RequestId) -> StoreResult<Option<LeaveRequest>>;

    /// Matching requests, newest first, paged by the filter's limit/offset
    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<LeaveRequest>>;

    /// Number of matching requests, ignoring paging
    async fn count_requests(&self, filter: &RequestFilter) -> StoreResult<u64>;

    /// Persist a pending request together with the balance that reserves its
    /// days. `balance.version` is the version the reservation was computed
    /// from (0 when the balance was initialized lazily).
    async fn insert_request(
        &self,
        draft: LeaveRequestDraft,
        balance: &Versioned<LeaveBalance>,
    ) -> StoreResult<LeaveRequest>;

    /// Persist a decided request together with its balance mutation. Fails
    /// with a conflict unless the stored request is still pending and the
    /// stored balance is at `balance.version`.
    async fn record_decision(&self, request: &LeaveRequest, balance: &Versioned<LeaveBalance>) -> StoreResult<()>;
}
