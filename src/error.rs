use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::models::RequestStatus;

/// Every way an insert, update or delete against the club hub tables can be refused.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: i32 },
    #[error("referenced {entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: i32 },
    #[error("{0}")]
    Duplicate(String),
    #[error("user {user_id} still leads project {project_id}")]
    Protected { user_id: i32, project_id: i32 },
    #[error("parent conversation {parent_id} is not in channel {channel_id}")]
    ChannelMismatch { parent_id: i32, channel_id: i32 },
    #[error("cannot move a request from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
    #[error("{entity} {id} is already closed")]
    AlreadyClosed { entity: &'static str, id: i32 },
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error(transparent)]
    Database(DieselError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<DieselError> for ModelError {
    fn from(e: DieselError) -> ModelError {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ModelError::Duplicate(info.message().to_string())
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation,
                info,
            ) => ModelError::Constraint(info.message().to_string()),
            e => ModelError::Database(e),
        }
    }
}

impl ModelError {
    pub fn not_found(entity: &'static str, id: i32) -> ModelError {
        ModelError::NotFound { entity, id }
    }

    pub fn missing(entity: &'static str, id: i32) -> ModelError {
        ModelError::MissingReference { entity, id }
    }
}
