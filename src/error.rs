//! Error types shared by the overlay engine and its collaborators

use thiserror::Error;

/// Errors raised by the overlay library.
///
/// Rendering failures are fail-soft: callers log them and keep the previous
/// frame. Only `TaskbarNotFound` and `WindowCreation` stop the overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("taskbar window not found")]
    TaskbarNotFound,

    #[error("failed to create overlay window: {0}")]
    WindowCreation(String),

    #[error("surface allocation failed: {0}")]
    Surface(String),

    #[error("text rendering failed: {0}")]
    Text(String),

    #[error("Could not fetch menu: {0}")]
    Fetch(String),

    #[error("{0}")]
    Parse(String),

    #[error("registry error: {0}")]
    Registry(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
