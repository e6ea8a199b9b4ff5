use thiserror::Error;

/// Validation failures raised while building domain values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Age cannot be negative: {0}")]
    NegativeAge(i32),

    #[error("Team name cannot be empty")]
    EmptyTeamName,

    #[error("Team must be saved before members can reference it")]
    UnsavedTeam,

    #[error("Page size must be greater than zero")]
    InvalidPageSize,
}

/// Errors that can occur in the repository layer
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Expected at most {expected} result(s) but query returned {actual}")]
    NonUniqueResult { expected: usize, actual: usize },

    #[error("Unknown sort property: {0}")]
    InvalidSortProperty(String),

    #[error("Lock could not be acquired: {0}")]
    LockTimeout(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Coarse grouping of PostgreSQL SQLSTATE codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SqlStateClass {
    LockNotAvailable,
    IntegrityConstraint,
    Other,
}

impl SqlStateClass {
    pub(crate) fn of(code: &str) -> Self {
        // 55P03 lock_not_available, class 23 integrity_constraint_violation
        if code == "55P03" {
            SqlStateClass::LockNotAvailable
        } else if code.starts_with("23") {
            SqlStateClass::IntegrityConstraint
        } else {
            SqlStateClass::Other
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let class = match &err {
            sqlx::Error::Database(db_err) => db_err
                .code()
                .map(|code| SqlStateClass::of(&code))
                .unwrap_or(SqlStateClass::Other),
            _ => SqlStateClass::Other,
        };

        match class {
            SqlStateClass::LockNotAvailable => RepositoryError::LockTimeout(err.to_string()),
            SqlStateClass::IntegrityConstraint => {
                RepositoryError::ConstraintViolation(err.to_string())
            }
            SqlStateClass::Other => RepositoryError::Database(err),
        }
    }
}
