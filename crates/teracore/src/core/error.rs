use thiserror::Error;

/// Centralized error type for startup, configuration and CLI code paths.
///
/// Per-task pipeline failures are modelled separately by
/// [`crate::download::PipelineError`]; this enum covers everything around it.
///
/// # Example
///
/// ```no_run
/// use teracore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("BOT_TOKEN is not set".into());
        assert_eq!(err.to_string(), "Configuration error: BOT_TOKEN is not set");
    }

    #[test]
    fn test_invalid_resolver_backend_is_config_error() {
        let err = "selenium".parse::<crate::download::ResolverBackend>().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("RESOLVER_BACKEND"));
    }
}
