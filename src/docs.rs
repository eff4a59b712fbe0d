use crate::api::leave::{
    BalanceResponse, CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse, LeaveTypeResponse, OnLeaveQuery,
    PayResponse, RejectLeave, UsageQuery, UsageResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave entitlement and approval

Tracks how much leave each employee is entitled to, validates new leave
requests against that entitlement, and moves requests through approval.

### Key Features
- **Leave catalog**: annual, sick, maternity, paternity, bereavement, unpaid, marriage, study and custom leave, each with its own entitlement, certificate rule and pay rate
- **Working days**: durations skip weekends and public holidays; half-days count 0.5
- **Balances**: submitted days are reserved, approval moves them to used, rejection and cancellation release them
- **Reporting**: who is on leave on a date, and approved days per department

### Security
All endpoints are protected using **JWT Bearer authentication**.
Only **Admin** or **HR** can approve, reject or act on other employees' leave.

### Response Format
- JSON-based RESTful responses
- Errors carry a machine-readable `error` kind and a `message`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,
        crate::api::leave::get_balance,
        crate::api::leave::on_leave,
        crate::api::leave::department_usage,
        crate::api::leave::leave_catalog
    ),
    components(
        schemas(
            CreateLeave,
            RejectLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            PayResponse,
            BalanceResponse,
            LeaveTypeResponse,
            OnLeaveQuery,
            UsageQuery,
            UsageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave requests, balances and reporting"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
