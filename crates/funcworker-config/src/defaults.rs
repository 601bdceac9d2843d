use crate::logging::LogFormat;
use crate::policy::{ConversionStrategy, InvocationFailurePolicy};

/// Default log filter expression used by the worker.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Entry point looked up in a module's exports when serving requests.
pub const DEFAULT_ENTRY_POINT: &str = "handler";

/// Default log filter expression used by the worker.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default diagnostic output format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default source conversion strategy.
#[must_use]
pub const fn default_strategy() -> ConversionStrategy {
    ConversionStrategy::Signature
}

/// Default module entry point name.
#[must_use]
pub fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_owned()
}

/// Default reaction to a failing invocation.
#[must_use]
pub const fn default_failure_policy() -> InvocationFailurePolicy {
    InvocationFailurePolicy::Crash
}
