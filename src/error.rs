/*
 * Responsibility
 * - AppError: every failure the request pipeline can raise
 * - FaultKind / FaultRecord: the stable, client-safe error shape
 * - IntoResponse for AppError only tags a bare status response with a PendingFault.
 *   The body is written once, by middleware::faults (single translation boundary).
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::TokenError;
use crate::services::policy::PolicyDenied;

/// Error kinds exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    Unauthenticated,
    Forbidden,
    Validation,
    NotFound,
    Internal,
}

impl FaultKind {
    pub fn status(self) -> StatusCode {
        match self {
            FaultKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            FaultKind::Forbidden => StatusCode::FORBIDDEN,
            FaultKind::Validation => StatusCode::BAD_REQUEST,
            FaultKind::NotFound => StatusCode::NOT_FOUND,
            FaultKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify an error status that was produced without an `AppError`
    /// (router fallback, extractor rejections, collaborator 5xx).
    ///
    /// Returns `None` for non-error statuses.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_server_error() {
            return Some(FaultKind::Internal);
        }
        if !status.is_client_error() {
            return None;
        }
        Some(match status {
            StatusCode::UNAUTHORIZED => FaultKind::Unauthenticated,
            StatusCode::FORBIDDEN => FaultKind::Forbidden,
            StatusCode::NOT_FOUND => FaultKind::NotFound,
            _ => FaultKind::Validation,
        })
    }

    pub fn generic_message(self) -> &'static str {
        match self {
            FaultKind::Unauthenticated => "authentication is required",
            FaultKind::Forbidden => "access to this operation is not permitted",
            FaultKind::Validation => "the request is invalid",
            FaultKind::NotFound => "the requested resource was not found",
            FaultKind::Internal => "internal server error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Response body for every failed request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultRecord {
    pub error_kind: FaultKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldViolation>,
}

/// A failure that has been raised but not rendered yet.
///
/// Travels in the response extensions from the point of failure up to the
/// fault translator. `detail` is for operators only and never leaves the process.
#[derive(Debug, Clone)]
pub struct PendingFault {
    pub kind: FaultKind,
    pub message: String,
    pub fields: Vec<FieldViolation>,
    pub detail: Option<String>,
}

impl PendingFault {
    pub fn new(kind: FaultKind) -> Self {
        Self {
            kind,
            message: kind.generic_message().to_string(),
            fields: Vec::new(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn into_record(self, correlation_id: Option<String>) -> FaultRecord {
        FaultRecord {
            error_kind: self.kind,
            message: self.message,
            correlation_id,
            fields: self.fields,
        }
    }
}

impl IntoResponse for PendingFault {
    fn into_response(self) -> Response {
        let mut res = self.kind.status().into_response();
        res.extensions_mut().insert(self);
        res
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldViolation>,
    },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: "request validation failed".to_string(),
            fields: vec![FieldViolation::new(field, message)],
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::Internal(anyhow::anyhow!("{detail}"))
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            AppError::Unauthenticated => FaultKind::Unauthenticated,
            AppError::Forbidden => FaultKind::Forbidden,
            AppError::Validation { .. } => FaultKind::Validation,
            AppError::NotFound { .. } => FaultKind::NotFound,
            AppError::Internal(_) => FaultKind::Internal,
        }
    }
}

impl From<AppError> for PendingFault {
    fn from(e: AppError) -> Self {
        let kind = e.kind();
        match e {
            AppError::Validation { message, fields } => PendingFault {
                kind,
                message,
                fields,
                detail: None,
            },
            AppError::NotFound { resource } => PendingFault {
                kind,
                message: format!("{resource} not found."),
                fields: Vec::new(),
                detail: None,
            },
            // `{:#}` keeps the whole context chain for the operator.
            AppError::Internal(err) => PendingFault::new(kind).with_detail(format!("{err:#}")),
            AppError::Unauthenticated | AppError::Forbidden => PendingFault::new(kind),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        PendingFault::from(self).into_response()
    }
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        // The reason is logged by the validator; clients only learn the kind.
        AppError::Unauthenticated
    }
}

impl From<PolicyDenied> for AppError {
    fn from(_: PolicyDenied) -> Self {
        AppError::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(FaultKind::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(FaultKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(FaultKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(FaultKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            FaultKind::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unmarked_statuses_are_classified() {
        assert_eq!(FaultKind::from_status(StatusCode::OK), None);
        assert_eq!(FaultKind::from_status(StatusCode::NO_CONTENT), None);
        assert_eq!(
            FaultKind::from_status(StatusCode::UNPROCESSABLE_ENTITY),
            Some(FaultKind::Validation)
        );
        assert_eq!(
            FaultKind::from_status(StatusCode::METHOD_NOT_ALLOWED),
            Some(FaultKind::Validation)
        );
        assert_eq!(
            FaultKind::from_status(StatusCode::NOT_FOUND),
            Some(FaultKind::NotFound)
        );
        assert_eq!(
            FaultKind::from_status(StatusCode::BAD_GATEWAY),
            Some(FaultKind::Internal)
        );
    }

    #[test]
    fn internal_error_keeps_detail_out_of_the_record() {
        let err = AppError::Internal(anyhow::anyhow!("db password rejected").context("loading patient"));
        let pending = PendingFault::from(err);

        assert_eq!(pending.kind, FaultKind::Internal);
        assert_eq!(
            pending.detail.as_deref(),
            Some("loading patient: db password rejected")
        );

        let record = pending.into_record(Some("req-1".into()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errorKind": "Internal",
                "message": "internal server error",
                "correlationId": "req-1",
            })
        );
    }

    #[test]
    fn validation_exposes_field_detail() {
        let record = PendingFault::from(AppError::invalid_field("birthDate", "must be in the past"))
            .into_record(None);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["errorKind"], "Validation");
        assert_eq!(json["fields"][0]["field"], "birthDate");
        assert!(json.get("correlationId").is_none());
    }

    #[test]
    fn validation_message_reaches_the_client() {
        let record = PendingFault::from(AppError::validation("page size must be at most 100"))
            .into_record(Some("req-2".into()));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "errorKind": "Validation",
                "message": "page size must be at most 100",
                "correlationId": "req-2",
            })
        );
    }

    #[test]
    fn token_and_policy_failures_keep_their_kinds() {
        assert_eq!(
            AppError::from(crate::services::auth::TokenError::MissingHeader).kind(),
            FaultKind::Unauthenticated
        );
        let denied = PolicyDenied {
            policy: "Patient".to_string(),
            subject: "patient-1".to_string(),
        };
        assert_eq!(AppError::from(denied).kind(), FaultKind::Forbidden);
    }

    #[test]
    fn error_response_is_a_tagged_bare_status() {
        let res = AppError::not_found("patient").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let pending = res.extensions().get::<PendingFault>().unwrap();
        assert_eq!(pending.message, "patient not found.");
    }
}
