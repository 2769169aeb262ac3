//! Error message formatting with actionable suggestions.

use std::error::Error;

use brio_core::error::BrioError;
use super::colors::ColorSupport;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
        }
    }

    /// Format an error with its category, suggestion and source chain
    pub fn format_error(&self, error: &BrioError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(&format!("[{:?}]: {}\n", error.kind(), error));

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            output.push('\n');
            source = err.source();
        }

        output
    }

    /// Format a simple error message
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_with_suggestion() {
        let error = BrioError::CyclicDependency {
            cycle: "a -> b -> a".to_string(),
        };
        let text = ErrorFormatter::plain().format_error(&error);

        assert!(text.starts_with("error["));
        assert!(text.contains("a -> b -> a"));
        assert!(text.contains("help: Remove circular dependencies"));
    }

    #[test]
    fn test_format_error_with_source() {
        let error = BrioError::io(
            "Failed to read brio.toml".to_string(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let text = ErrorFormatter::plain().format_error(&error);

        assert!(text.contains("caused by: no such file"));
    }
}
