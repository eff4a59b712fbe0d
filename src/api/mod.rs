pub mod leave;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::error::LeaveError;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_)
            | LeaveError::InvalidRange { .. }
            | LeaveError::InvalidHalfDayRange { .. }
            | LeaveError::UnknownLeaveType(_)
            | LeaveError::CertificateRequired { .. } => StatusCode::BAD_REQUEST,
            LeaveError::EmployeeNotFound(_) | LeaveError::NoBalanceRecord { .. } | LeaveError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LeaveError::InsufficientBalance { .. } | LeaveError::InvalidTransition { .. } | LeaveError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            LeaveError::InvariantViolation(_) | LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Leave operation failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}
