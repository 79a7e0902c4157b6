//! Failure policy hooks for loads and refreshes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;

/// Provider operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretOperation {
    Load,
    Refresh,
}

impl SecretOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretOperation::Load => "load",
            SecretOperation::Refresh => "refresh",
        }
    }
}

impl fmt::Display for SecretOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an exception handler sees. Setting `ignore` tolerates the failure.
///
/// For loads `ignore` starts out as the provider's `optional` flag; for
/// refreshes it starts out `false`.
#[derive(Debug)]
pub struct ExceptionContext<'a> {
    pub operation: SecretOperation,
    pub secret_name: &'a str,
    pub error: &'a ProviderError,
    /// Time from the start of the operation until the failure.
    pub elapsed: Duration,
    pub ignore: bool,
}

/// Callback deciding whether a failure is tolerated.
pub type ExceptionHandler = Arc<dyn Fn(&mut ExceptionContext<'_>) + Send + Sync>;

/// Handler tolerating every failure.
pub fn ignore_all() -> ExceptionHandler {
    Arc::new(|ctx: &mut ExceptionContext<'_>| ctx.ignore = true)
}

/// Handler tolerating a missing secret and nothing else.
pub fn ignore_not_found() -> ExceptionHandler {
    Arc::new(|ctx: &mut ExceptionContext<'_>| {
        if ctx.error.is_not_found() {
            ctx.ignore = true;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(error: &ProviderError) -> ExceptionContext<'_> {
        ExceptionContext {
            operation: SecretOperation::Refresh,
            secret_name: "app",
            error,
            elapsed: Duration::from_millis(5),
            ignore: false,
        }
    }

    #[test]
    fn test_ignore_not_found_only_matches_missing_secrets() {
        let handler = ignore_not_found();

        let missing = ProviderError::not_found("app");
        let mut ctx = context(&missing);
        handler(&mut ctx);
        assert!(ctx.ignore);

        let broken = ProviderError::parse("app");
        let mut ctx = context(&broken);
        handler(&mut ctx);
        assert!(!ctx.ignore);
    }

    #[test]
    fn test_ignore_all() {
        let err = ProviderError::timeout("fetch_secret", 10);
        let mut ctx = context(&err);
        ignore_all()(&mut ctx);
        assert!(ctx.ignore);
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(SecretOperation::Load.to_string(), "load");
        assert_eq!(SecretOperation::Refresh.as_str(), "refresh");
    }
}
