use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CitasError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    DatabaseError(String),
    RealtimeError(String),
    SideEffectError(String),
    ConfigurationError(String),
    InternalError(String),
}

impl fmt::Display for CitasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitasError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            CitasError::NotFoundError(msg) => write!(f, "Not found: {msg}"),
            CitasError::ConflictError(msg) => write!(f, "Conflict: {msg}"),
            CitasError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            CitasError::RealtimeError(msg) => write!(f, "Realtime error: {msg}"),
            CitasError::SideEffectError(msg) => write!(f, "Side effect error: {msg}"),
            CitasError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            CitasError::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for CitasError {}

impl From<sqlx::Error> for CitasError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CitasError::NotFoundError("row not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                CitasError::ConflictError(db_err.to_string())
            }
            other => CitasError::DatabaseError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CitasError>;

impl CitasError {
    /// Errors that abort a primary operation. Anything else is downstream
    /// best-effort work and must be caught at the call site.
    pub fn aborts_primary_operation(&self) -> bool {
        matches!(
            self,
            CitasError::ValidationError(_)
                | CitasError::NotFoundError(_)
                | CitasError::ConflictError(_)
                | CitasError::DatabaseError(_)
        )
    }
}
