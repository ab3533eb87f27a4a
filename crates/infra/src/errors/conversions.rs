//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tidesync_common::storage::StorageError;
use tidesync_domain::TideSyncError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TideSyncError);

impl From<InfraError> for TideSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TideSyncError> for InfraError {
    fn from(value: TideSyncError) -> Self {
        InfraError(value)
    }
}

trait IntoTideSyncError {
    fn into_tidesync(self) -> TideSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → TideSyncError */
/* -------------------------------------------------------------------------- */

impl IntoTideSyncError for SqlError {
    fn into_tidesync(self) -> TideSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        TideSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        TideSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        TideSyncError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => TideSyncError::Database(format!(
                        "foreign key constraint violation: {message}"
                    )),
                    _ => TideSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => TideSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                TideSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                TideSyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                TideSyncError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                TideSyncError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => TideSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => TideSyncError::Database("invalid SQL query".into()),
            other => TideSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_tidesync())
    }
}

/* -------------------------------------------------------------------------- */
/* Pool and storage errors → TideSyncError */
/* -------------------------------------------------------------------------- */

impl IntoTideSyncError for StorageError {
    fn into_tidesync(self) -> TideSyncError {
        match self {
            StorageError::Rusqlite(err) => err.into_tidesync(),
            StorageError::InvalidConfig(message) => TideSyncError::Config(message),
            other => TideSyncError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_tidesync())
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(TideSyncError::Database(format!("pool error: {value}")))
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(TideSyncError::Internal(format!("blocking task failed: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(TideSyncError::InvalidInput(format!("invalid JSON payload: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TideSyncError */
/* -------------------------------------------------------------------------- */

impl IntoTideSyncError for HttpError {
    fn into_tidesync(self) -> TideSyncError {
        if self.is_timeout() {
            return TideSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return TideSyncError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return TideSyncError::InvalidInput(format!("undecodable response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                429 => TideSyncError::RateLimited { retry_after: None },
                _ => TideSyncError::Remote { status: code, message },
            };
        }

        TideSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_tidesync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
