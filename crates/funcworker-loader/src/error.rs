//! Conversion and invocation errors.

use thiserror::Error;

/// Source text could not be turned into a callable unit.
///
/// The worker answers every one of these with `function_loaded: false` and
/// stays ready for another attempt.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The `data` payload of the `function` message was not a string.
    #[error("function source must be a string, got {found}")]
    NonTextSource {
        /// JSON type that was received instead.
        found: &'static str,
    },

    /// No `function name(` declaration was found.
    #[error("no named function declaration found in source")]
    MissingDeclaration,

    /// The declaration's parameter list was never closed.
    #[error("parameter list of '{name}' has no closing parenthesis")]
    UnterminatedParameters {
        /// Declared function name.
        name: String,
    },

    /// No `{ ... }` body followed the parameter list.
    #[error("function '{name}' has no braced body")]
    MissingBody {
        /// Declared function name.
        name: String,
    },

    /// The interpreter rejected the generated or submitted code.
    #[error("failed to compile function: {message}")]
    Compile {
        /// Interpreter message without the stack traceback.
        message: String,
        /// Underlying interpreter error.
        #[source]
        source: mlua::Error,
    },

    /// Running a module chunk raised an error.
    #[error("module raised while loading: {message}")]
    Execute {
        /// Interpreter message without the stack traceback.
        message: String,
        /// Underlying interpreter error.
        #[source]
        source: mlua::Error,
    },

    /// A module chunk ran but left no exports behind.
    #[error("module did not export anything")]
    NoExports,

    /// The interpreter itself could not be prepared.
    #[error("failed to prepare interpreter: {source}")]
    Interpreter {
        /// Underlying interpreter error.
        #[source]
        source: mlua::Error,
    },
}

impl ConversionError {
    /// Classifies a JSON payload that should have been source text.
    #[must_use]
    pub const fn non_text(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        };
        Self::NonTextSource { found }
    }

    pub(crate) fn compile(source: mlua::Error) -> Self {
        Self::Compile {
            message: lua_message(&source),
            source,
        }
    }

    pub(crate) fn execute(source: mlua::Error) -> Self {
        Self::Execute {
            message: lua_message(&source),
            source,
        }
    }

    pub(crate) const fn interpreter(source: mlua::Error) -> Self {
        Self::Interpreter { source }
    }
}

/// A loaded function failed while serving a request.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The request argument could not be converted into a Lua value.
    #[error("request argument cannot be passed to the function: {source}")]
    Argument {
        /// Underlying conversion error.
        #[source]
        source: mlua::Error,
    },

    /// The function raised an error.
    #[error("function raised: {message}")]
    Raised {
        /// Interpreter message without the stack traceback.
        message: String,
        /// Underlying interpreter error.
        #[source]
        source: mlua::Error,
    },

    /// The module's exports have no callable under the entry point name.
    #[error("module does not export a callable '{name}'")]
    MissingEntryPoint {
        /// Entry point that was looked up.
        name: String,
    },

    /// The function returned something JSON cannot represent.
    #[error("function result cannot be encoded as JSON: {source}")]
    Unrepresentable {
        /// Underlying conversion error.
        #[source]
        source: mlua::Error,
    },
}

impl InvocationError {
    pub(crate) fn raised(source: mlua::Error) -> Self {
        Self::Raised {
            message: lua_message(&source),
            source,
        }
    }
}

/// Extracts the human-readable part of an interpreter error.
///
/// Runtime errors carry a stack traceback after the message; callback
/// errors wrap the error that actually occurred.
fn lua_message(error: &mlua::Error) -> String {
    match error {
        mlua::Error::CallbackError { cause, .. } => lua_message(cause),
        mlua::Error::RuntimeError(message) | mlua::Error::SyntaxError { message, .. } => message
            .split_once("\nstack traceback:")
            .map_or(message.as_str(), |(head, _)| head)
            .to_owned(),
        other => other.to_string(),
    }
}
