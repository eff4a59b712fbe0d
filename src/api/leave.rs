use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::error::{LeaveError, LeaveResult};
use crate::leave::balance::LeaveBalance;
use crate::leave::catalog::{LeaveTypeDefinition, PayBreakdown, PayRate};
use crate::leave::engine::LeaveEngine;
use crate::leave::query::UsageLine;
use crate::leave::request::{LeaveApplication, LeaveRequest, LeaveStatus, RequestFilter, RequestId};
use crate::leave::types::{HalfDayPeriod, LeaveType};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1000)]
    /// Employee the leave is for; defaults to the caller's own employee record
    pub employee_id: Option<u64>,
    #[schema(example = "annual")]
    /// annual, sick, maternity, paternity, bereavement, unpaid, marriage, study or custom
    pub leave_type: Option<String>,
    #[schema(example = "2026-10-19", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-10-21", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    #[schema(example = false)]
    pub half_day: bool,
    #[schema(example = "morning")]
    /// morning or afternoon; required when half_day is set
    pub half_day_period: Option<String>,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
    #[serde(default)]
    #[schema(example = false)]
    pub has_certificate: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Peak season")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayResponse {
    #[schema(example = 3.0)]
    pub full_pay: f64,
    #[schema(example = 0.0)]
    pub half_pay: f64,
    #[schema(example = 0.0)]
    pub unpaid: f64,
}

impl From<PayBreakdown> for PayResponse {
    fn from(pay: PayBreakdown) -> Self {
        Self {
            full_pay: pay.full_pay.as_f64(),
            half_pay: pay.half_pay.as_f64(),
            unpaid: pay.unpaid.as_f64(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave application id
    pub id: u64,
    /// employee id for whom the leave is applied
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Ada Lovelace")]
    pub employee_name: String,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2026-10-19", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-10-21", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = json!(null))]
    pub half_day_period: Option<String>,
    #[schema(example = 3.0)]
    /// chargeable working days
    pub duration: f64,
    #[schema(example = "Family trip")]
    pub reason: String,
    pub has_certificate: bool,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = json!(null))]
    pub decided_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub pay: Option<PayResponse>,
    #[schema(example = "2026-10-16T09:00:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(request: LeaveRequest) -> Self {
        let state = request.state();
        Self {
            id: request.id.0,
            employee_id: request.employee_id,
            status: state.status().as_str().to_string(),
            decided_by: state.decided_by(),
            decided_at: state.decided_at(),
            rejection_reason: state.rejection_reason().map(str::to_string),
            employee_name: request.employee_name,
            department: request.department,
            leave_type: request.leave_type.as_str().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            half_day_period: request.half_day.map(|p| p.as_str().to_string()),
            duration: request.duration.as_f64(),
            reason: request.reason,
            has_certificate: request.has_certificate,
            pay: request.pay.map(PayResponse::from),
            submitted_at: request.submitted_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID (ignored for employees, who only see their own)
    pub employee_id: Option<u64>,
    #[schema(example = 4)]
    /// Filter by department ID
    pub department_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = "annual")]
    /// Filter by leave type
    pub leave_type: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 12.0)]
    pub entitled: f64,
    #[schema(example = 3.0)]
    pub used: f64,
    #[schema(example = 0.0)]
    pub pending: f64,
    #[schema(example = 0.0)]
    pub carry_over: f64,
    #[schema(example = 9.0)]
    pub remaining: f64,
}

impl From<LeaveBalance> for BalanceResponse {
    fn from(balance: LeaveBalance) -> Self {
        Self {
            employee_id: balance.employee_id(),
            leave_type: balance.leave_type().as_str().to_string(),
            entitled: balance.entitled().as_f64(),
            used: balance.used().as_f64(),
            pending: balance.pending().as_f64(),
            carry_over: balance.carry_over().as_f64(),
            remaining: balance.remaining().as_f64(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveTypeResponse {
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = 12.0)]
    pub days_per_year: f64,
    pub requires_certificate: bool,
    #[schema(example = 3.0)]
    /// certificate needed only beyond this many days; absent means always
    pub certificate_after: Option<f64>,
    #[schema(example = "medical certificate")]
    pub certificate_kind: Option<String>,
    pub carry_over_cap: Option<f64>,
    #[schema(example = "split")]
    pub pay_rate: String,
}

impl From<&LeaveTypeDefinition> for LeaveTypeResponse {
    fn from(definition: &LeaveTypeDefinition) -> Self {
        Self {
            leave_type: definition.id.as_str().to_string(),
            days_per_year: definition.days_per_year.as_f64(),
            requires_certificate: definition.requires_certificate,
            certificate_after: definition.certificate_after.map(|d| d.as_f64()),
            certificate_kind: definition.certificate_kind.clone(),
            carry_over_cap: definition.carry_over_cap.map(|d| d.as_f64()),
            pay_rate: match definition.pay_rate {
                PayRate::Full => "full",
                PayRate::Unpaid => "unpaid",
                PayRate::Split { .. } => "split",
            }
            .to_string(),
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct OnLeaveQuery {
    #[schema(example = "2026-10-20", format = "date", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UsageQuery {
    #[schema(example = 4)]
    pub department_id: u64,
    #[schema(example = "2026-10-01", format = "date", value_type = String)]
    pub from: NaiveDate,
    #[schema(example = "2026-10-31", format = "date", value_type = String)]
    pub to: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 7.5)]
    pub days: f64,
    #[schema(example = 3)]
    pub requests: u32,
}

impl From<UsageLine> for UsageResponse {
    fn from(line: UsageLine) -> Self {
        Self {
            leave_type: line.leave_type.as_str().to_string(),
            days: line.days.as_f64(),
            requests: line.requests,
        }
    }
}

fn parse_period(value: &str) -> LeaveResult<HalfDayPeriod> {
    HalfDayPeriod::from_str(value.trim())
        .map_err(|_| LeaveError::validation(format!("unknown half-day period '{value}'")))
}

fn parse_status(value: &str) -> LeaveResult<LeaveStatus> {
    LeaveStatus::from_str(value.trim()).map_err(|_| LeaveError::validation(format!("unknown leave status '{value}'")))
}

/// Register the `/leave` scope on a protected service config.
///
/// The fixed segments are registered ahead of `/{leave_id}` so they are not
/// taken for ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            .service(
                web::resource("")
                    .route(web::get().to(leave_list))
                    .route(web::post().to(create_leave)),
            )
            .service(web::resource("/catalog").route(web::get().to(leave_catalog)))
            .service(web::resource("/on-leave").route(web::get().to(on_leave)))
            .service(web::resource("/usage").route(web::get().to(department_usage)))
            .service(
                web::resource("/balance/{employee_id}/{leave_type}").route(web::get().to(get_balance)),
            )
            .service(web::resource("/{leave_id}").route(web::get().to(get_leave)))
            .service(web::resource("/{leave_id}/approve").route(web::put().to(approve_leave)))
            .service(web::resource("/{leave_id}/reject").route(web::put().to(reject_leave)))
            .service(web::resource("/{leave_id}/cancel").route(web::put().to(cancel_leave))),
    );
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted and days reserved", body = LeaveResponse),
        (status = 400, description = "Invalid request, unknown leave type or missing certificate", body = Object, example = json!({
            "error": "certificate_required",
            "message": "sick leave of 5 days requires a medical certificate"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Insufficient balance", body = Object, example = json!({
            "error": "insufficient_balance",
            "message": "insufficient balance: requested 5 days, 2 remaining"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<HttpResponse> {
    let payload = payload.into_inner();

    // HR may file on behalf of anyone; everybody else files for themselves
    let employee_id = match payload.employee_id {
        Some(id) => {
            auth.require_self_or_hr(id)?;
            id
        }
        None => auth.own_employee_id()?,
    };

    let application = LeaveApplication {
        employee_id: Some(employee_id),
        leave_type: payload.leave_type.as_deref().map(LeaveType::parse).transpose()?,
        start_date: payload.start_date,
        end_date: payload.end_date,
        half_day: payload.half_day,
        half_day_period: payload.half_day_period.as_deref().map(parse_period).transpose()?,
        reason: payload.reason,
        has_certificate: payload.has_certificate,
    };

    let request = engine.submit(&application).await?;
    Ok(HttpResponse::Created().json(LeaveResponse::from(request)))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and days committed", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided", body = Object, example = json!({
            "error": "invalid_transition",
            "message": "cannot approve leave request 1 in status approved"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let request = engine.approve(RequestId(path.into_inner()), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = RejectLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected and reserved days released", body = LeaveResponse),
        (status = 400, description = "Missing rejection reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let reason = payload.into_inner().reason.unwrap_or_default();
    let request = engine
        .reject(RequestId(path.into_inner()), auth.user_id, &reason)
        .await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/* =========================
Cancel leave (requester or HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the pending leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled and reserved days released", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let id = RequestId(path.into_inner());
    visible_request(&auth, &engine, id).await?;

    let request = engine.cancel(id, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "error": "not_found",
            "message": "leave request 1 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let request = visible_request(&auth, &engine, RequestId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/// Load a request the caller may see. Someone else's request looks exactly
/// like a missing one to callers who do not manage leave.
async fn visible_request(auth: &AuthUser, engine: &LeaveEngine, id: RequestId) -> Result<LeaveRequest, LeaveError> {
    let request = engine.queries().get_request(id).await?;
    if auth.acts_for(request.employee_id) {
        Ok(request)
    } else {
        Err(LeaveError::NotFound(id))
    }
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list, newest first", body = LeaveListResponse),
        (status = 400, description = "Unknown status or leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<HttpResponse> {
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let employee_id = if auth.role.manages_leave() {
        query.employee_id
    } else {
        Some(auth.own_employee_id()?)
    };

    let filter = RequestFilter {
        employee_id,
        department_id: query.department_id,
        leave_type: query.leave_type.as_deref().map(LeaveType::parse).transpose()?,
        status: query.status.as_deref().map(parse_status).transpose()?,
        ..RequestFilter::default()
    }
    .page(per_page, offset);

    let queries = engine.queries();
    let total = queries.count_requests(&filter).await?;
    let data = queries
        .list_requests(&filter)
        .await?
        .into_iter()
        .map(LeaveResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/balance/{employee_id}/{leave_type}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("leave_type" = String, Path, description = "Leave type name")
    ),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 400, description = "Unknown leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee has no balance for this leave type", body = Object, example = json!({
            "error": "no_balance_record",
            "message": "employee 1000 has no annual leave balance"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_balance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<(u64, String)>,
) -> actix_web::Result<HttpResponse> {
    let (employee_id, leave_type) = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let leave_type = LeaveType::parse(&leave_type)?;
    let balance = engine.queries().get_balance(employee_id, leave_type).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/on-leave",
    params(OnLeaveQuery),
    responses(
        (status = 200, description = "Approved leave covering the date", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn on_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<OnLeaveQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let absent: Vec<LeaveResponse> = engine
        .queries()
        .on_leave(query.date)
        .await?
        .into_iter()
        .map(LeaveResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(absent))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/usage",
    params(UsageQuery),
    responses(
        (status = 200, description = "Approved working days per leave type inside the window", body = [UsageResponse]),
        (status = 400, description = "Inverted window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn department_usage(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<UsageQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let usage: Vec<UsageResponse> = engine
        .queries()
        .department_usage(query.department_id, query.from, query.to)
        .await?
        .into_iter()
        .map(UsageResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(usage))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/catalog",
    responses(
        (status = 200, description = "Leave types and their policies", body = [LeaveTypeResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_catalog(_auth: AuthUser, engine: web::Data<LeaveEngine>) -> HttpResponse {
    let entries: Vec<LeaveTypeResponse> = engine
        .catalog()
        .definitions()
        .into_iter()
        .map(LeaveTypeResponse::from)
        .collect();
    HttpResponse::Ok().json(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::auth::middleware::auth_middleware;
    use crate::auth::role::Role;
    use crate::config::{Config, LeavePolicy};
    use crate::leave::calendar::WorkingDayCalculator;
    use crate::leave::catalog::Catalog;
    use crate::leave::directory::{EmployeeRecord, StaticDirectory};
    use crate::leave::store::MemoryLeaveStore;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    const SECRET: &str = "test-secret";

    fn config() -> Config {
        Config {
            database_url: "mysql://unused".to_string(),
            jwt_secret: SECRET.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_protected_per_min: 1000,
            api_prefix: "/api/v1".to_string(),
            leave: LeavePolicy::default(),
        }
    }

    fn engine() -> LeaveEngine {
        let employee = |id: u64, name: &str| EmployeeRecord {
            id,
            name: name.to_string(),
            department: Some("Engineering".to_string()),
            status: "active".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        let directory = Arc::new(
            StaticDirectory::new()
                .with_employee(employee(1, "Ada Lovelace"))
                .with_employee(employee(2, "Grace Hopper"))
                .with_department("Engineering", 4),
        );
        LeaveEngine::new(
            Arc::new(MemoryLeaveStore::new()),
            directory.clone(),
            directory,
            Catalog::standard(),
            WorkingDayCalculator::default(),
        )
    }

    fn bearer(user_id: u64, role: Role, employee_id: Option<u64>) -> (&'static str, String) {
        let token = generate_access_token(user_id, format!("user{user_id}"), role.id(), employee_id, SECRET, 900)
            .unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    fn ada() -> (&'static str, String) {
        bearer(11, Role::Employee, Some(1))
    }

    fn grace() -> (&'static str, String) {
        bearer(12, Role::Employee, Some(2))
    }

    fn hr() -> (&'static str, String) {
        bearer(50, Role::Hr, None)
    }

    macro_rules! leave_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config()))
                    .app_data(web::Data::new(engine()))
                    .service(web::scope("/api/v1").wrap(from_fn(auth_middleware)).configure(configure)),
            )
            .await
        };
    }

    fn annual_payload() -> Value {
        json!({
            "leave_type": "annual",
            "start_date": "2026-10-19",
            "end_date": "2026-10-21",
            "reason": "family trip"
        })
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = leave_app!();
        let req = test::TestRequest::get().uri("/api/v1/leave").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_submit_then_approve_moves_days_to_used() {
        let app = leave_app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .insert_header(ada())
            .set_json(annual_payload())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "pending");
        assert_eq!(body["duration"], 3.0);
        let id = body["id"].as_u64().unwrap();

        // employees cannot decide
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/approve"))
            .insert_header(ada())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/approve"))
            .insert_header(hr())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "approved");
        assert_eq!(body["decided_by"], 50);
        assert_eq!(body["pay"]["full_pay"], 3.0);

        let req = test::TestRequest::get()
            .uri("/api/v1/leave/balance/1/annual")
            .insert_header(ada())
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["used"], 3.0);
        assert_eq!(body["pending"], 0.0);
        assert_eq!(body["remaining"], 9.0);
    }

    #[actix_web::test]
    async fn test_missing_certificate_is_a_bad_request() {
        let app = leave_app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .insert_header(ada())
            .set_json(json!({
                "leave_type": "sick",
                "start_date": "2026-10-05",
                "end_date": "2026-10-09",
                "reason": "flu"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "certificate_required");
    }

    #[actix_web::test]
    async fn test_employees_only_see_and_cancel_their_own_leave() {
        let app = leave_app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .insert_header(hr())
            .set_json(json!({
                "employee_id": 2,
                "leave_type": "bereavement",
                "start_date": "2026-10-19",
                "end_date": "2026-10-20",
                "reason": "funeral"
            }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let id = body["id"].as_u64().unwrap();

        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .insert_header(ada())
            .set_json(annual_payload())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/v1/leave?employee_id=2")
            .insert_header(ada())
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["employee_id"], 1);

        // someone else's request answers exactly like a missing one
        let missing = id + 100;
        for uri in [format!("/api/v1/leave/{id}"), format!("/api/v1/leave/{missing}")] {
            let req = test::TestRequest::get().uri(&uri).insert_header(ada()).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "not_found");
        }
        for uri in [
            format!("/api/v1/leave/{id}/cancel"),
            format!("/api/v1/leave/{missing}/cancel"),
        ] {
            let req = test::TestRequest::put().uri(&uri).insert_header(ada()).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/cancel"))
            .insert_header(grace())
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["status"], "cancelled");

        // a decided request cannot be approved any more
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/approve"))
            .insert_header(hr())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_transition");
    }

    #[actix_web::test]
    async fn test_reject_requires_a_reason() {
        let app = leave_app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .insert_header(ada())
            .set_json(annual_payload())
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let id = body["id"].as_u64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/reject"))
            .insert_header(hr())
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/reject"))
            .insert_header(hr())
            .set_json(json!({"reason": "release week"}))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["rejection_reason"], "release week");
    }

    #[actix_web::test]
    async fn test_balance_without_enrolment_is_not_found() {
        let app = leave_app!();
        let req = test::TestRequest::get()
            .uri("/api/v1/leave/balance/2/study")
            .insert_header(hr())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "no_balance_record");
    }

    #[actix_web::test]
    async fn test_catalog_lists_every_leave_type() {
        let app = leave_app!();
        let req = test::TestRequest::get()
            .uri("/api/v1/leave/catalog")
            .insert_header(grace())
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 9);
        assert_eq!(entries[1]["leave_type"], "sick");
        assert_eq!(entries[1]["pay_rate"], "split");
        assert_eq!(entries[1]["certificate_after"], 3.0);
    }
}
