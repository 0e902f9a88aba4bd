// sqlx -> AppError mapping
//
// Lives here because of the orphan rule: core owns AppError and must not
// depend on sqlx, so a `From<sqlx::Error>` impl is not possible.

use drivebook_core::error::AppError;

/// Classify a sqlx error by SQLite result code (https://www.sqlite.org/rescode.html)
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            match db_err.code().as_deref() {
                Some(code @ ("2067" | "1555")) => {
                    AppError::Database(format!("Unique constraint violation: {} ({})", message, code))
                }
                Some(code @ ("787" | "3850")) => AppError::Database(format!(
                    "Foreign key constraint violation: {} ({})",
                    message, code
                )),
                Some(code @ ("275" | "1299")) => {
                    AppError::Database(format!("Constraint violation: {} ({})", message, code))
                }
                Some("5") => {
                    AppError::Database(format!("Database locked (SQLITE_BUSY): {}", message))
                }
                Some("13") => AppError::Database(format!("Database full: {}", message)),
                Some(code) => AppError::Database(format!("Database error [{}]: {}", code, message)),
                None => AppError::Database(format!("Database error: {}", message)),
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        sqlx::Error::PoolTimedOut => {
            AppError::Database("Timed out waiting for a pooled connection".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors() {
        match map_sqlx_error(sqlx::Error::RowNotFound) {
            AppError::Database(msg) => assert_eq!(msg, "Row not found"),
            other => panic!("unexpected: {:?}", other),
        }
        match map_sqlx_error(sqlx::Error::ColumnNotFound("end_ns".to_string())) {
            AppError::Database(msg) => assert!(msg.contains("end_ns")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
