//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use ringrelay_domain::RelayError;
use rusqlite::Error as SqlError;
use thiserror::Error;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub RelayError);

impl From<InfraError> for RelayError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RelayError> for InfraError {
    fn from(value: RelayError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRelayError {
    fn into_relay(self) -> RelayError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → RelayError */
/* -------------------------------------------------------------------------- */

impl IntoRelayError for SqlError {
    fn into_relay(self) -> RelayError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        RelayError::StoreUnavailable("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        RelayError::StoreUnavailable("database is locked".into())
                    }
                    ErrorCode::CannotOpen => RelayError::StoreUnavailable(format!(
                        "unable to open database file: {message}"
                    )),
                    _ => RelayError::StoreUnavailable(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => RelayError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                RelayError::StoreUnavailable(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                RelayError::StoreUnavailable(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => RelayError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => RelayError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_relay())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → RelayError */
/* -------------------------------------------------------------------------- */

impl IntoRelayError for PoolError {
    fn into_relay(self) -> RelayError {
        RelayError::StoreUnavailable(format!("connection pool: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_relay())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RelayError */
/* -------------------------------------------------------------------------- */

impl IntoRelayError for HttpError {
    fn into_relay(self) -> RelayError {
        if self.is_timeout() {
            return RelayError::Transient("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RelayError::Transient("HTTP connection failure".into());
        }

        if self.is_builder() {
            return RelayError::client(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return RelayError::Client {
                status: self.status().map(|s| s.as_u16()),
                message: format!("malformed response body: {self}"),
            };
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                500..=599 => RelayError::Transient(message),
                _ => RelayError::Client { status: Some(code), message },
            };
        }

        RelayError::Transient(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_relay())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
