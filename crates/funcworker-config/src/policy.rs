//! Behavioural switches for source conversion and invocation failures.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Algorithm used to turn submitted source text into an invocable unit.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConversionStrategy {
    /// Extracts parameters and body from the first `function name(...)`
    /// declaration found in the source.
    #[default]
    Signature,
    /// Executes the source as a module and calls its exported entry point.
    Module,
}

/// What the worker does when a loaded function fails during a request.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InvocationFailurePolicy {
    /// Terminate the worker so the orchestrator can restart it.
    #[default]
    Crash,
    /// Emit an `error` message and keep serving.
    Report,
}

/// Errors encountered while parsing a [`ConversionStrategy`] or
/// [`InvocationFailurePolicy`] from text.
pub type PolicyParseError = strum::ParseError;
