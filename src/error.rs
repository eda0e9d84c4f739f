use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use thiserror::Error;

/// Failures reported by an `EntryStore` or `AccountStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("foreign key constraint violated")]
    ForeignKeyViolation,

    #[error("database error: {0}")]
    Database(#[source] DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => StoreError::UniqueViolation,
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => StoreError::ForeignKeyViolation,
            other => StoreError::Database(other),
        }
    }
}

/// Errors surfaced at the request boundary. Each variant carries its own
/// status code and a short message safe to show to visitors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("missing credential")]
    Unauthenticated,

    #[error("invalid or expired credential")]
    InvalidCredential,

    #[error("bad username or password")]
    BadLogin,

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("booth name already exists")]
    DuplicateBooth,

    #[error("booth still has guestbook entries")]
    BoothInUse,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation { field, message: message.into() }
    }

    /// Message placed in the `{"error": ...}` body.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Unauthenticated => "로그인이 필요합니다.".to_string(),
            ApiError::InvalidCredential => "유효하지 않거나 만료된 인증 정보입니다.".to_string(),
            ApiError::BadLogin => "잘못된 사용자명 또는 비밀번호입니다.".to_string(),
            ApiError::PermissionDenied => "권한이 없습니다.".to_string(),
            ApiError::NotFound("booth") => "부스를 찾을 수 없습니다.".to_string(),
            ApiError::NotFound(_) => "요청한 항목을 찾을 수 없습니다.".to_string(),
            ApiError::DuplicateBooth => "이미 존재하는 부스 이름입니다.".to_string(),
            ApiError::BoothInUse => "방명록 기록이 있는 부스는 삭제할 수 없습니다.".to_string(),
            ApiError::Store(_) | ApiError::Internal(_) => "서버 오류가 발생했습니다.".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::DuplicateBooth => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::BadLogin => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredential | ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BoothInUse => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("request failed: {:?}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.public_message() })
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(e: r2d2::Error) -> Self {
        ApiError::Store(StoreError::Pool(e))
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
