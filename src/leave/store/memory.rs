//! In-memory store for tests and local runs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{LeaveStore, StoreError, StoreResult};
use crate::leave::balance::{BalanceKey, LeaveBalance, Version, Versioned};
use crate::leave::request::{LeaveRequest, LeaveRequestDraft, LeaveStatus, RequestFilter, RequestId};

#[derive(Default)]
struct Inner {
    balances: HashMap<BalanceKey, Versioned<LeaveBalance>>,
    requests: BTreeMap<RequestId, LeaveRequest>,
    next_id: u64,
}

impl Inner {
    fn check_balance_version(&self, balance: &Versioned<LeaveBalance>) -> StoreResult<()> {
        let key = balance.value.key();
        let stored = self.balances.get(&key).map_or(0, |b| b.version);
        if stored != balance.version {
            return Err(StoreError::conflict(format!(
                "balance {}/{} is at version {stored}, expected {}",
                key.employee_id, key.leave_type, balance.version
            )));
        }
        Ok(())
    }

    fn write_balance(&mut self, balance: &Versioned<LeaveBalance>) {
        self.balances.insert(
            balance.value.key(),
            Versioned::new(balance.value.clone(), balance.version + 1),
        );
    }
}

#[derive(Clone, Default)]
pub struct MemoryLeaveStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn balance(&self, key: BalanceKey) -> StoreResult<Option<Versioned<LeaveBalance>>> {
        Ok(self.inner.lock().await.balances.get(&key).cloned())
    }

    async fn create_balance(&self, balance: &LeaveBalance) -> StoreResult<Version> {
        let mut inner = self.inner.lock().await;
        let unsaved = Versioned::unsaved(balance.clone());
        inner.check_balance_version(&unsaved)?;
        inner.write_balance(&unsaved);
        Ok(1)
    }

    async fn request(&self, id: RequestId) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.inner.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<LeaveRequest>> {
        let inner = self.inner.lock().await;
        let matching = inner
            .requests
            .values()
            .rev()
            .filter(|r| filter.matches(r))
            .skip(filter.offset as usize);

        Ok(match filter.limit {
            Some(limit) => matching.take(limit as usize).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn count_requests(&self, filter: &RequestFilter) -> StoreResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.requests.values().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn insert_request(
        &self,
        draft: LeaveRequestDraft,
        balance: &Versioned<LeaveBalance>,
    ) -> StoreResult<LeaveRequest> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.requests.values().find(|r| {
            r.employee_id == draft.employee_id
                && r.is_active()
                && r.overlaps(draft.start_date, draft.end_date, draft.half_day)
        }) {
            return Err(StoreError::Overlap(existing.id));
        }
        inner.check_balance_version(balance)?;

        inner.next_id += 1;
        let request = draft.into_request(RequestId(inner.next_id));
        inner.write_balance(balance);
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn record_decision(&self, request: &LeaveRequest, balance: &Versioned<LeaveBalance>) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;

        match inner.requests.get(&request.id) {
            Some(stored) if stored.status() == LeaveStatus::Pending => {}
            Some(stored) => {
                return Err(StoreError::conflict(format!(
                    "leave request {} is already {}",
                    request.id,
                    stored.status()
                )));
            }
            None => return Err(StoreError::conflict(format!("leave request {} vanished", request.id))),
        }
        inner.check_balance_version(balance)?;

        inner.write_balance(balance);
        inner.requests.insert(request.id, request.clone());
        Ok(())
    }
}
