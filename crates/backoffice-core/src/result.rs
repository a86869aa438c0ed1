//! Result alias shared by every backoffice crate.

use crate::error::AppError;

/// `Result` specialised to [`AppError`].
pub type AppResult<T> = Result<T, AppError>;
