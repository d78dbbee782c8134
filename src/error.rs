use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("{0} is still referenced and cannot be deleted")]
    InUse(String),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("unknown {kind} `{name}`")]
    UnknownMember { kind: &'static str, name: String },

    #[error("unsupported media type `{0}`")]
    UnsupportedMedia(String),

    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("database is not responding")]
    Unavailable,

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("database error: {0}")]
    Database(#[from] DieselError),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ServiceError {
    pub(crate) fn not_found(kind: &str, key: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {}", kind, key))
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ServiceError::Invalid(msg.into())
    }

    /// Whether the error says something about the health of the database
    /// rather than about the request. Only these trip the circuit breaker.
    pub(crate) fn is_infrastructure(&self) -> bool {
        match self {
            ServiceError::Pool(_) => true,
            ServiceError::Database(e) => !is_constraint_violation(e),
            _ => false,
        }
    }
}

fn is_constraint_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
            | DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

impl From<failsafe::Error<ServiceError>> for ServiceError {
    fn from(err: failsafe::Error<ServiceError>) -> Self {
        match err {
            failsafe::Error::Inner(e) => e,
            //rejected which means sql db is not responsive
            failsafe::Error::Rejected => ServiceError::Unavailable,
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Invalid(_) => StatusCode::BAD_REQUEST,
            ServiceError::InUse(_) | ServiceError::Duplicate(_) => StatusCode::CONFLICT,
            ServiceError::UnknownMember { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServiceError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Unavailable | ServiceError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Database(e) if is_constraint_violation(e) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Cache(_) | ServiceError::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(
            ServiceError::not_found("dish", 4).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::invalid("price").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InUse("ingredient Salt".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::UnknownMember {
                kind: "dish",
                name: "Fries".into()
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn only_infrastructure_errors_trip_the_breaker() {
        assert!(ServiceError::Database(DieselError::RollbackTransaction).is_infrastructure());
        assert!(!ServiceError::not_found("store", 1).is_infrastructure());
        assert!(!ServiceError::Unavailable.is_infrastructure());
    }

    #[test]
    fn rejected_calls_become_unavailable() {
        let err: ServiceError = failsafe::Error::<ServiceError>::Rejected.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ServiceError = failsafe::Error::Inner(ServiceError::invalid("x")).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(
            ServiceError::not_found("combo", 12).to_string(),
            "combo 12 not found"
        );
    }
}
