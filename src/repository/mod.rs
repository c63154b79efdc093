pub mod bookings;
pub mod invoices;
pub mod properties;
pub mod settings;

use crate::error::AppError;

/// Map a database failure onto the error taxonomy, logging the real cause
/// and keeping the client-facing message generic.
pub(crate) fn map_db_error(error: sqlx::Error) -> AppError {
    tracing::error!(error = %error, "Database query failed");
    AppError::Dependency("Database request failed.".to_string())
}
