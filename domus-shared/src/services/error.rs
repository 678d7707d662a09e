use crate::auth::{authorization::AuthzError, password::PasswordError};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a business operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// A single field broke a business rule
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The request as a whole cannot be honoured
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Maps a violation of `constraint` to `Conflict(message)`, anything else to `Database`
    pub fn from_unique_violation(err: sqlx::Error, constraint: &str, message: &str) -> Self {
        let violated = matches!(
            &err,
            sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint)
        );

        if violated {
            ServiceError::Conflict(message.to_string())
        } else {
            ServiceError::Database(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_display() {
        assert_eq!(ServiceError::NotFound("Family").to_string(), "Family not found");
        assert_eq!(
            ServiceError::validation("postal_code", "must be 5 digits").to_string(),
            "postal_code: must be 5 digits"
        );
        assert_eq!(
            ServiceError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_authz_converts() {
        let family_id = Uuid::new_v4();
        let err: ServiceError = AuthzError::NotMember(family_id).into();
        assert!(matches!(err, ServiceError::Authz(AuthzError::NotMember(id)) if id == family_id));
    }

    #[test]
    fn test_unrelated_error_is_not_a_conflict() {
        let err = ServiceError::from_unique_violation(
            sqlx::Error::RowNotFound,
            "users_email_key",
            "Email already registered",
        );
        assert!(matches!(err, ServiceError::Database(sqlx::Error::RowNotFound)));
    }
}
