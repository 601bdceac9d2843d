//! Layered configuration for the function worker.
//!
//! Values resolve in increasing precedence from built-in defaults, a TOML
//! file (`--config-path` or `FUNCWORKER_CONFIG_PATH`), `FUNCWORKER_*`
//! environment variables and finally command-line flags. With no overrides
//! the worker behaves exactly as the bare line protocol describes: signature
//! extraction, `handler` as the module entry point, and fail-fast invocation
//! errors.

mod defaults;
mod logging;
mod policy;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::defaults::{
    DEFAULT_ENTRY_POINT, DEFAULT_LOG_FILTER, default_entry_point, default_failure_policy,
    default_log_filter, default_log_filter_string, default_log_format, default_strategy,
};
pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::policy::{ConversionStrategy, InvocationFailurePolicy, PolicyParseError};

/// Resolved worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FUNCWORKER")]
pub struct Config {
    /// Conversion strategy applied to `function` messages.
    #[ortho_config(default = crate::defaults::default_strategy())]
    pub strategy: ConversionStrategy,
    /// Name of the exported callable used by the module strategy.
    #[ortho_config(default = crate::defaults::default_entry_point())]
    pub entry_point: String,
    /// Reaction to a function raising while serving a request.
    #[ortho_config(default = crate::defaults::default_failure_policy())]
    pub on_invoke_error: InvocationFailurePolicy,
    /// Emits a protocol `log` line for every honoured request.
    #[ortho_config(default = false)]
    pub request_logging: bool,
    /// `tracing` filter expression for diagnostics on stderr.
    #[ortho_config(default = crate::defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for diagnostics on stderr.
    #[ortho_config(default = crate::defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            entry_point: default_entry_point(),
            on_invoke_error: default_failure_policy(),
            request_logging: false,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Conversion strategy applied to `function` messages.
    #[must_use]
    pub const fn strategy(&self) -> ConversionStrategy {
        self.strategy
    }

    /// Entry point name used by the module strategy.
    #[must_use]
    pub const fn entry_point(&self) -> &str {
        self.entry_point.as_str()
    }

    /// Reaction to invocation failures.
    #[must_use]
    pub const fn on_invoke_error(&self) -> InvocationFailurePolicy {
        self.on_invoke_error
    }

    /// Whether honoured requests are traced on the protocol stream.
    #[must_use]
    pub const fn request_logging(&self) -> bool {
        self.request_logging
    }

    /// Diagnostic filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Diagnostic output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Checks invariants the layered sources cannot express on their own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyEntryPoint`] when the entry point is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_point.trim().is_empty() {
            return Err(ConfigError::EmptyEntryPoint);
        }
        Ok(())
    }
}

/// Errors raised by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The module entry point name was empty or whitespace.
    #[error("entry_point must name an exported function")]
    EmptyEntryPoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_bare_protocol() {
        let config = Config::default();
        assert_eq!(config.strategy(), ConversionStrategy::Signature);
        assert_eq!(config.entry_point(), "handler");
        assert_eq!(config.on_invoke_error(), InvocationFailurePolicy::Crash);
        assert!(!config.request_logging());
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn blank_entry_point_fails_validation() {
        let config = Config {
            entry_point: String::from("   "),
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyEntryPoint));
    }

    #[test]
    fn default_config_validates() {
        assert_eq!(Config::default().validate(), Ok(()));
    }
}
