use axum::{http::StatusCode, Json};
use serde::Serialize;
use uuid::Uuid;

use treadline_core::errors::InterfaceError;

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

pub fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an interface error onto its HTTP rendering. Detail stays in the logs;
/// the body carries the user-safe message plus the correlation id.
pub fn error_response(error: InterfaceError) -> (StatusCode, Json<ErrorBody>) {
    let correlation_id = match &error {
        InterfaceError::BadRequest { correlation_id, .. }
        | InterfaceError::Conflict { correlation_id, .. }
        | InterfaceError::ServiceUnavailable { correlation_id, .. }
        | InterfaceError::Internal { correlation_id, .. } => correlation_id.clone(),
    };

    (
        status_for(&error),
        Json(ErrorBody { error: error.user_message().to_string(), correlation_id }),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::error_response;
    use treadline_core::errors::{ApplicationError, DomainError};

    #[test]
    fn domain_errors_render_as_bad_request() {
        let interface = ApplicationError::from(DomainError::UnknownServiceType(
            "detailing".to_string(),
        ))
        .into_interface("req-9");

        let (status, body) = error_response(interface);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.correlation_id, "req-9");
    }

    #[test]
    fn storage_errors_render_as_service_unavailable() {
        let interface =
            ApplicationError::Storage("sheets timeout".to_string()).into_interface("req-10");
        let (status, _) = error_response(interface);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
