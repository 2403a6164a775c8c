use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("authorization for {plate} no longer holds: {detail}")]
    StaleAuthorization { plate: String, detail: String },
    #[error("the reservation window must end after it starts and must not be over already")]
    InvalidWindow,
    #[error("visitor vehicle {0} must be registered before it can be booked")]
    UnknownVisitorVehicle(String),
    #[error("spot {0} already has a reservation overlapping the requested window")]
    OverlapConflict(i32),
    #[error("spot {0} is occupied right now and the requested window includes the present")]
    CurrentlyOccupiedConflict(i32),
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    KeyValueStoreError(#[from] redis::RedisError),
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("ログインに失敗しました")]
    UnauthenticatedError,
    #[error("認可情報が誤っています")]
    UnauthorizedError,
}

impl AppError {
    /// The caller may run the whole resolve → register sequence once more.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StaleAuthorization { .. })
    }

    /// Failures of the surrounding infrastructure rather than business denials.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamUnavailable(_)
                | AppError::TransactionError(_)
                | AppError::SpecificOperationError(_)
                | AppError::NoRowsAffectedError(_)
                | AppError::KeyValueStoreError(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_)
            | AppError::ConvertToUuidError(_)
            | AppError::ConversionEntityError(_)
            | AppError::InvalidWindow => StatusCode::BAD_REQUEST,
            AppError::UnprocessableEntity(_)
            | AppError::UnknownVisitorVehicle(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StaleAuthorization { .. }
            | AppError::OverlapConflict(_)
            | AppError::CurrentlyOccupiedConflict(_) => StatusCode::CONFLICT,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                StatusCode::UNAUTHORIZED
            }
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            AppError::EntityNotFound(_) => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::StaleAuthorization { .. } => "STALE_AUTHORIZATION",
            AppError::InvalidWindow => "INVALID_WINDOW",
            AppError::UnknownVisitorVehicle(_) => "UNKNOWN_VISITOR_VEHICLE",
            AppError::OverlapConflict(_) => "OVERLAP_CONFLICT",
            AppError::CurrentlyOccupiedConflict(_) => "CURRENTLY_OCCUPIED_CONFLICT",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_) => "DATABASE_ERROR",
            AppError::KeyValueStoreError(_) => "KEY_VALUE_STORE_ERROR",
            AppError::ConvertToUuidError(_) | AppError::ConversionEntityError(_) => {
                "CONVERSION_ERROR"
            }
            AppError::UnauthenticatedError => "UNAUTHENTICATED",
            AppError::UnauthorizedError => "UNAUTHORIZED",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
        } else {
            tracing::debug!(status = %status_code, error.message = %self, "Request rejected");
        }

        let body = Json(json!({
            "error_code": self.error_code(),
            "message": self.to_string(),
        }));
        (status_code, body).into_response()
    }
}

// エラー型が AppError であるような Result 型
pub type AppResult<T> = Result<T, AppError>;
