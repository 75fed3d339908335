/// Severity levels for logged failures
#[derive(Debug, Clone, Copy)]
pub enum ErrorSeverity {
    Warning,
    Error,
}

/// Extension trait for ergonomic error emission
pub trait ResultExt<T> {
    /// Log the error side of a result through tracing, passing the result through
    fn emit_event(self, severity: ErrorSeverity) -> Self;

    /// Log at warn level
    fn emit_warning(self) -> Self;

    /// Log at error level
    fn emit_error(self) -> Self;
}

use tracing::{error, warn};

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Debug,
{
    fn emit_event(self, severity: ErrorSeverity) -> Self {
        if let Err(err) = self.as_ref() {
            match severity {
                ErrorSeverity::Warning => {
                    warn!(target: "promptdeck::error", "Warning: {:?}", err)
                }
                ErrorSeverity::Error => error!(target: "promptdeck::error", "Error: {:?}", err),
            }
        }
        self
    }

    fn emit_warning(self) -> Self {
        self.emit_event(ErrorSeverity::Warning)
    }

    fn emit_error(self) -> Self {
        self.emit_event(ErrorSeverity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emission_passes_the_result_through() {
        let ok: Result<i32, String> = Ok(1);
        assert_eq!(ok.emit_warning().unwrap(), 1);

        let err: Result<i32, String> = Err("boom".to_string());
        assert_eq!(err.emit_error().unwrap_err(), "boom");
    }
}
