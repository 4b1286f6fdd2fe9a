use thiserror::Error;
use serde::Serialize;

/// Host-side errors, serializable so command failures cross the IPC boundary
/// as structured values instead of opaque strings.
#[derive(Error, Debug, Serialize)]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Window Error: {0}")]
    Window(String),

    #[error("Validation Error: {0}")]
    Validation(String),
}

// Implement conversion from standard errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

impl From<tauri::Error> for AppError {
    fn from(err: tauri::Error) -> Self {
        AppError::Window(err.to_string())
    }
}

// Helper for Tauri Result
pub type AppResult<T> = Result<T, AppError>;
