//! MySQL-backed store.
//!
//! Balance writes carry `AND version = ?` and decisions carry
//! `AND status = 'pending'`; a guard that matches no row is reported as a
//! conflict and the surrounding transaction is rolled back.
//!
//! Both multi-record writes lock the balance row before touching
//! `leave_requests`, so concurrent writers for one employee queue on the
//! same row. Deadlocks and lock-wait timeouts InnoDB still reports are
//! surfaced as conflicts and retried by the engine.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlDatabaseError;
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use tracing::debug;

use super::{LeaveStore, StoreError, StoreResult};
use crate::leave::balance::{BalanceKey, LeaveBalance, Version, Versioned};
use crate::leave::catalog::PayBreakdown;
use crate::leave::request::{
    LeaveRequest, LeaveRequestDraft, LeaveStatus, RequestFilter, RequestId, RequestState, periods_overlap,
};
use crate::leave::types::{Days, HalfDayPeriod, LeaveType};

const REQUEST_COLUMNS: &str = r#"
    id, employee_id, employee_name, department, department_id, leave_type,
    start_date, end_date, half_day_period, duration, reason, has_certificate,
    status, decided_by, decided_at, rejection_reason,
    full_pay_days, half_pay_days, unpaid_days, created_at
"#;

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BalanceRow {
    employee_id: u64,
    leave_type: String,
    entitled: f64,
    used: f64,
    pending: f64,
    carry_over: f64,
    version: u64,
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    department: Option<String>,
    department_id: Option<u64>,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    half_day_period: Option<String>,
    duration: f64,
    reason: String,
    has_certificate: bool,
    status: String,
    decided_by: Option<u64>,
    decided_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    full_pay_days: Option<f64>,
    half_pay_days: Option<f64>,
    unpaid_days: Option<f64>,
    created_at: DateTime<Utc>,
}

fn corrupt(what: impl std::fmt::Display) -> StoreError {
    StoreError::Database(format!("corrupt row: {what}"))
}

fn days(value: f64) -> StoreResult<Days> {
    Days::try_from_f64(value).map_err(corrupt)
}

impl TryFrom<BalanceRow> for Versioned<LeaveBalance> {
    type Error = StoreError;

    fn try_from(row: BalanceRow) -> StoreResult<Self> {
        let leave_type = LeaveType::parse(&row.leave_type).map_err(corrupt)?;
        let balance = LeaveBalance::restore(
            BalanceKey::new(row.employee_id, leave_type),
            days(row.entitled)?,
            days(row.used)?,
            days(row.pending)?,
            days(row.carry_over)?,
        )
        .map_err(corrupt)?;
        Ok(Versioned::new(balance, row.version))
    }
}

impl TryFrom<RequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> StoreResult<Self> {
        let status: LeaveStatus = row.status.parse().map_err(|_| corrupt(&row.status))?;
        let state = match (status, row.decided_by, row.decided_at) {
            (LeaveStatus::Pending, _, _) => RequestState::Pending,
            (LeaveStatus::Approved, Some(decided_by), Some(decided_at)) => RequestState::Approved {
                decided_by,
                decided_at,
            },
            (LeaveStatus::Rejected, Some(decided_by), Some(decided_at)) => RequestState::Rejected {
                decided_by,
                decided_at,
                reason: row.rejection_reason.unwrap_or_default(),
            },
            (LeaveStatus::Cancelled, Some(decided_by), Some(decided_at)) => RequestState::Cancelled {
                decided_by,
                decided_at,
            },
            (status, _, _) => return Err(corrupt(format!("request {} is {status} without a decision", row.id))),
        };

        let half_day = row
            .half_day_period
            .as_deref()
            .map(|p| p.parse::<HalfDayPeriod>().map_err(|_| corrupt(p)))
            .transpose()?;

        let pay = match (row.full_pay_days, row.half_pay_days, row.unpaid_days) {
            (Some(full), Some(half), Some(unpaid)) => Some(PayBreakdown {
                full_pay: days(full)?,
                half_pay: days(half)?,
                unpaid: days(unpaid)?,
            }),
            _ => None,
        };

        Ok(LeaveRequest {
            id: RequestId(row.id),
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            department: row.department,
            department_id: row.department_id,
            leave_type: LeaveType::parse(&row.leave_type).map_err(corrupt)?,
            start_date: row.start_date,
            end_date: row.end_date,
            half_day,
            duration: days(row.duration)?,
            reason: row.reason,
            has_certificate: row.has_certificate,
            submitted_at: row.created_at,
            state,
            pay,
        })
    }
}

const ER_DUP_ENTRY: u16 = 1062;
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    DuplicateKey,
    LockContention,
    Other,
}

/// Classify a server error by MySQL error number, falling back to SQLSTATE.
fn classify(number: Option<u16>, sqlstate: Option<&str>) -> Failure {
    match (number, sqlstate) {
        (Some(ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT), _) | (_, Some("40001")) => Failure::LockContention,
        (Some(ER_DUP_ENTRY), _) | (None, Some("23000")) => Failure::DuplicateKey,
        _ => Failure::Other,
    }
}

fn failure_of(err: &sqlx::Error) -> Failure {
    match err {
        sqlx::Error::Database(db_err) => {
            let number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number);
            classify(number, db_err.code().as_deref())
        }
        _ => Failure::Other,
    }
}

fn is_duplicate_key(err: &sqlx::Error) -> bool {
    failure_of(err) == Failure::DuplicateKey
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match failure_of(&err) {
            Failure::LockContention => StoreError::Conflict(err.to_string()),
            Failure::DuplicateKey | Failure::Other => StoreError::Database(err.to_string()),
        }
    }
}

/// Lock the balance row and check it is still at the version the caller
/// read. A missing row counts as version 0.
async fn lock_balance(conn: &mut MySqlConnection, balance: &Versioned<LeaveBalance>) -> StoreResult<()> {
    let b = &balance.value;
    let stored = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT version
        FROM leave_balances
        WHERE employee_id = ?
        AND leave_type = ?
        FOR UPDATE
        "#,
    )
    .bind(b.employee_id())
    .bind(b.leave_type().as_str())
    .fetch_optional(&mut *conn)
    .await?
    .unwrap_or(0);

    if stored != balance.version {
        return Err(StoreError::conflict(format!(
            "balance {}/{} is at version {stored}, expected {}",
            b.employee_id(),
            b.leave_type(),
            balance.version
        )));
    }
    Ok(())
}

/// Write a balance guarded by its expected version.
async fn write_balance(conn: &mut MySqlConnection, balance: &Versioned<LeaveBalance>) -> StoreResult<()> {
    let b = &balance.value;

    if balance.version == 0 {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_balances
                (employee_id, leave_type, entitled, used, pending, carry_over, version)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(b.employee_id())
        .bind(b.leave_type().as_str())
        .bind(b.entitled().as_f64())
        .bind(b.used().as_f64())
        .bind(b.pending().as_f64())
        .bind(b.carry_over().as_f64())
        .execute(&mut *conn)
        .await;

        return match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::conflict(format!(
                "balance {}/{} already exists",
                b.employee_id(),
                b.leave_type()
            ))),
            Err(e) => Err(e.into()),
        };
    }

    let result = sqlx::query(
        r#"
        UPDATE leave_balances
        SET entitled = ?, used = ?, pending = ?, carry_over = ?, version = version + 1
        WHERE employee_id = ?
        AND leave_type = ?
        AND version = ?
        "#,
    )
    .bind(b.entitled().as_f64())
    .bind(b.used().as_f64())
    .bind(b.pending().as_f64())
    .bind(b.carry_over().as_f64())
    .bind(b.employee_id())
    .bind(b.leave_type().as_str())
    .bind(balance.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::conflict(format!(
            "balance {}/{} moved past version {}",
            b.employee_id(),
            b.leave_type(),
            balance.version
        )));
    }
    Ok(())
}

// Helper enum for typed SQLx binding
#[derive(Debug, PartialEq)]
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

fn where_clause(filter: &RequestFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }
    if let Some(department_id) = filter.department_id {
        where_sql.push_str(" AND department_id = ?");
        args.push(FilterValue::U64(department_id));
    }
    if let Some(leave_type) = filter.leave_type {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type.as_str().to_string()));
    }
    if let Some(status) = filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.as_str().to_string()));
    }
    if let Some(date) = filter.on_date {
        where_sql.push_str(" AND start_date <= ? AND end_date >= ?");
        args.push(FilterValue::Date(date));
        args.push(FilterValue::Date(date));
    }
    if let Some((from, to)) = filter.overlapping {
        where_sql.push_str(" AND start_date <= ? AND end_date >= ?");
        args.push(FilterValue::Date(to));
        args.push(FilterValue::Date(from));
    }

    (where_sql, args)
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn balance(&self, key: BalanceKey) -> StoreResult<Option<Versioned<LeaveBalance>>> {
        let row = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT employee_id, leave_type, entitled, used, pending, carry_over, version
            FROM leave_balances
            WHERE employee_id = ?
            AND leave_type = ?
            "#,
        )
        .bind(key.employee_id)
        .bind(key.leave_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Versioned::<LeaveBalance>::try_from).transpose()
    }

    async fn create_balance(&self, balance: &LeaveBalance) -> StoreResult<Version> {
        let mut conn = self.pool.acquire().await?;
        write_balance(&mut conn, &Versioned::unsaved(balance.clone())).await?;
        Ok(1)
    }

    async fn request(&self, id: RequestId) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<LeaveRequest>> {
        let (where_sql, args) = where_clause(filter);
        let data_sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests
            {where_sql}
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#
        );

        let mut data_q = sqlx::query_as::<_, RequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let rows = data_q
            .bind(filter.limit.unwrap_or(u64::MAX))
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn count_requests(&self, filter: &RequestFilter) -> StoreResult<u64> {
        let (where_sql, args) = where_clause(filter);
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(v),
                FilterValue::Str(s) => count_q.bind(s),
                FilterValue::Date(d) => count_q.bind(d),
            };
        }

        let total = count_q.fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn insert_request(
        &self,
        draft: LeaveRequestDraft,
        balance: &Versioned<LeaveBalance>,
    ) -> StoreResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;
        lock_balance(&mut tx, balance).await?;

        // lock the employee's active requests in range before checking them
        let active = sqlx::query_as::<_, (u64, NaiveDate, NaiveDate, Option<String>)>(
            r#"
            SELECT id, start_date, end_date, half_day_period
            FROM leave_requests
            WHERE employee_id = ?
            AND status IN ('pending', 'approved')
            AND start_date <= ?
            AND end_date >= ?
            FOR UPDATE
            "#,
        )
        .bind(draft.employee_id)
        .bind(draft.end_date)
        .bind(draft.start_date)
        .fetch_all(&mut *tx)
        .await?;

        for (id, start, end, period) in active {
            let period = period
                .as_deref()
                .map(|p| p.parse::<HalfDayPeriod>().map_err(|_| corrupt(p)))
                .transpose()?;
            if periods_overlap((start, end, period), (draft.start_date, draft.end_date, draft.half_day)) {
                return Err(StoreError::Overlap(RequestId(id)));
            }
        }

        write_balance(&mut tx, balance).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, employee_name, department, department_id, leave_type,
                 start_date, end_date, half_day_period, duration, reason, has_certificate,
                 status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(draft.employee_id)
        .bind(&draft.employee_name)
        .bind(&draft.department)
        .bind(draft.department_id)
        .bind(draft.leave_type.as_str())
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.half_day.map(HalfDayPeriod::as_str))
        .bind(draft.duration.as_f64())
        .bind(&draft.reason)
        .bind(draft.has_certificate)
        .bind(draft.submitted_at)
        .execute(&mut *tx)
        .await?;

        let id = RequestId(result.last_insert_id());
        tx.commit().await?;
        debug!(request_id = %id, "leave request stored");

        Ok(draft.into_request(id))
    }

    async fn record_decision(&self, request: &LeaveRequest, balance: &Versioned<LeaveBalance>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_balance(&mut tx, balance).await?;
        let state = request.state();
        let pay = request.pay.unwrap_or_default();
        let has_pay = request.pay.is_some();

        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, decided_by = ?, decided_at = ?, rejection_reason = ?,
                full_pay_days = ?, half_pay_days = ?, unpaid_days = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(state.status().as_str())
        .bind(state.decided_by())
        .bind(state.decided_at())
        .bind(state.rejection_reason())
        .bind(has_pay.then(|| pay.full_pay.as_f64()))
        .bind(has_pay.then(|| pay.half_pay.as_f64()))
        .bind(has_pay.then(|| pay.unpaid.as_f64()))
        .bind(request.id.0)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::conflict(format!(
                "leave request {} is no longer pending",
                request.id
            )));
        }

        write_balance(&mut tx, balance).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn balance_row(entitled: f64, used: f64, pending: f64) -> BalanceRow {
        BalanceRow {
            employee_id: 3,
            leave_type: "annual".to_string(),
            entitled,
            used,
            pending,
            carry_over: 0.0,
            version: 4,
        }
    }

    fn request_row(status: &str) -> RequestRow {
        RequestRow {
            id: 12,
            employee_id: 3,
            employee_name: "Mary Jackson".to_string(),
            department: Some("Engineering".to_string()),
            department_id: Some(10),
            leave_type: "sick".to_string(),
            start_date: date(10, 19),
            end_date: date(10, 19),
            half_day_period: Some("afternoon".to_string()),
            duration: 0.5,
            reason: "dentist".to_string(),
            has_certificate: false,
            status: status.to_string(),
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
            full_pay_days: None,
            half_pay_days: None,
            unpaid_days: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 12, 9, 0, 0).unwrap(),
        }
    }

    /// Server error carrying only a SQLSTATE, as a non-MySQL driver would report it
    #[derive(Debug)]
    struct ServerError(&'static str);

    impl std::fmt::Display for ServerError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "server error {}", self.0)
        }
    }

    impl std::error::Error for ServerError {}

    impl DatabaseError for ServerError {
        fn message(&self) -> &str {
            "server error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn server_error(sqlstate: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ServerError(sqlstate)))
    }

    #[test]
    fn test_lock_contention_is_classified_by_error_number() {
        assert_eq!(classify(Some(1213), Some("40001")), Failure::LockContention);
        // lock wait timeout reports the generic HY000 state
        assert_eq!(classify(Some(1205), Some("HY000")), Failure::LockContention);
        assert_eq!(classify(None, Some("40001")), Failure::LockContention);

        assert_eq!(classify(Some(1062), Some("23000")), Failure::DuplicateKey);
        assert_eq!(classify(None, Some("23000")), Failure::DuplicateKey);
        // foreign key failures share 23000 but are not duplicates
        assert_eq!(classify(Some(1452), Some("23000")), Failure::Other);
        assert_eq!(classify(Some(1064), Some("42000")), Failure::Other);
        assert_eq!(classify(None, None), Failure::Other);
    }

    #[test]
    fn test_deadlock_becomes_a_retryable_conflict() {
        assert!(matches!(StoreError::from(server_error("40001")), StoreError::Conflict(_)));
        assert!(matches!(StoreError::from(server_error("23000")), StoreError::Database(_)));
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Database(_)));

        assert!(is_duplicate_key(&server_error("23000")));
        assert!(!is_duplicate_key(&server_error("40001")));
        assert!(!is_duplicate_key(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_where_clause_without_criteria() {
        let (sql, args) = where_clause(&RequestFilter::default());
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());
    }

    #[test]
    fn test_where_clause_binds_in_placeholder_order() {
        let filter = RequestFilter {
            employee_id: Some(3),
            department_id: Some(10),
            leave_type: Some(LeaveType::Sick),
            status: Some(LeaveStatus::Approved),
            on_date: Some(date(10, 20)),
            overlapping: Some((date(10, 1), date(10, 31))),
            ..RequestFilter::default()
        };
        let (sql, args) = where_clause(&filter);

        assert_eq!(
            sql,
            " WHERE 1=1 AND employee_id = ? AND department_id = ? AND leave_type = ? AND status = ? \
             AND start_date <= ? AND end_date >= ? AND start_date <= ? AND end_date >= ?"
        );
        assert_eq!(sql.matches('?').count(), args.len());
        assert_eq!(
            args,
            vec![
                FilterValue::U64(3),
                FilterValue::U64(10),
                FilterValue::Str("sick".to_string()),
                FilterValue::Str("approved".to_string()),
                FilterValue::Date(date(10, 20)),
                FilterValue::Date(date(10, 20)),
                // a window intersects when it starts before `to` and ends after `from`
                FilterValue::Date(date(10, 31)),
                FilterValue::Date(date(10, 1)),
            ]
        );
    }

    #[test]
    fn test_balance_row_round_trips_through_restore() {
        let balance = Versioned::<LeaveBalance>::try_from(balance_row(12.0, 3.5, 1.0)).unwrap();
        assert_eq!(balance.version, 4);
        assert_eq!(balance.value.key(), BalanceKey::new(3, LeaveType::Annual));
        assert_eq!(balance.value.used(), Days::whole(3) + Days::HALF);
        assert_eq!(balance.value.remaining(), Days::whole(7) + Days::HALF);
    }

    #[test]
    fn test_corrupt_balance_rows_are_refused() {
        // overdrawn
        assert!(Versioned::<LeaveBalance>::try_from(balance_row(5.0, 4.0, 2.0)).is_err());
        // not a multiple of half a day
        assert!(Versioned::<LeaveBalance>::try_from(balance_row(12.0, 1.25, 0.0)).is_err());
        assert!(Versioned::<LeaveBalance>::try_from(balance_row(-1.0, 0.0, 0.0)).is_err());

        let mut row = balance_row(12.0, 0.0, 0.0);
        row.leave_type = "sabbatical".to_string();
        assert!(matches!(
            Versioned::<LeaveBalance>::try_from(row),
            Err(StoreError::Database(msg)) if msg.starts_with("corrupt row")
        ));
    }

    #[test]
    fn test_request_rows_rebuild_each_state() {
        let pending = LeaveRequest::try_from(request_row("pending")).unwrap();
        assert_eq!(pending.state(), &RequestState::Pending);
        assert_eq!(pending.half_day, Some(HalfDayPeriod::Afternoon));
        assert_eq!(pending.duration, Days::HALF);
        assert_eq!(pending.leave_type, LeaveType::Sick);
        assert_eq!(pending.pay, None);

        let decided_at = Utc.with_ymd_and_hms(2026, 10, 13, 14, 30, 0).unwrap();

        let mut row = request_row("approved");
        row.decided_by = Some(50);
        row.decided_at = Some(decided_at);
        row.full_pay_days = Some(0.5);
        row.half_pay_days = Some(0.0);
        row.unpaid_days = Some(0.0);
        let approved = LeaveRequest::try_from(row).unwrap();
        assert_eq!(
            approved.state(),
            &RequestState::Approved {
                decided_by: 50,
                decided_at
            }
        );
        assert_eq!(
            approved.pay,
            Some(PayBreakdown {
                full_pay: Days::HALF,
                half_pay: Days::ZERO,
                unpaid: Days::ZERO,
            })
        );

        let mut row = request_row("rejected");
        row.decided_by = Some(50);
        row.decided_at = Some(decided_at);
        row.rejection_reason = Some("coverage gap".to_string());
        assert_eq!(LeaveRequest::try_from(row).unwrap().state().rejection_reason(), Some("coverage gap"));

        let mut row = request_row("cancelled");
        row.decided_by = Some(3);
        row.decided_at = Some(decided_at);
        assert_eq!(LeaveRequest::try_from(row).unwrap().status(), LeaveStatus::Cancelled);
    }

    #[test]
    fn test_decided_request_without_decision_is_corrupt() {
        for status in ["approved", "rejected", "cancelled"] {
            let mut row = request_row(status);
            row.decided_by = Some(50);
            assert!(LeaveRequest::try_from(row).is_err(), "{status} without decided_at");

            let mut row = request_row(status);
            row.decided_at = Some(Utc.with_ymd_and_hms(2026, 10, 13, 14, 30, 0).unwrap());
            assert!(LeaveRequest::try_from(row).is_err(), "{status} without decided_by");
        }

        assert!(LeaveRequest::try_from(request_row("archived")).is_err());

        let mut row = request_row("pending");
        row.half_day_period = Some("evening".to_string());
        assert!(LeaveRequest::try_from(row).is_err());
    }
}
