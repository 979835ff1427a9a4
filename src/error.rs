use axum::http::StatusCode;
use tracing::error;

/// Failures raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column already holds this value.
    #[error("{0} already taken")]
    Conflict(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => return Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                if let Some(field) = db.constraint().and_then(conflicting_field) {
                    return Self::Conflict(field);
                }
            }
            _ => {}
        }
        Self::Db(e)
    }
}

/// Maps a unique constraint on `users` to the field it guards.
pub fn conflicting_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "users_username_key" => Some("username"),
        "users_utor_id_key" => Some("utor_id"),
        "users_email_key" => Some("email"),
        _ => None,
    }
}

impl From<StoreError> for (StatusCode, String) {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
            StoreError::NotFound => (StatusCode::NOT_FOUND, "Not found".into()),
            StoreError::Db(inner) => {
                error!(error = %inner, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_constraints_map_to_fields() {
        assert_eq!(conflicting_field("users_username_key"), Some("username"));
        assert_eq!(conflicting_field("users_utor_id_key"), Some("utor_id"));
        assert_eq!(conflicting_field("users_email_key"), Some("email"));
        assert_eq!(conflicting_field("group_members_pkey"), None);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn conflict_maps_to_409_with_field_name() {
        let (status, msg) = <(StatusCode, String)>::from(StoreError::Conflict("username"));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(msg, "username already taken");
    }

    #[test]
    fn db_error_hides_details() {
        let (status, msg) = <(StatusCode, String)>::from(StoreError::Db(sqlx::Error::PoolTimedOut));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("pool"));
    }
}
