//! Source-to-function conversion for the function worker.
//!
//! A worker receives its function as source text and must turn it into
//! something it can call once per request. This crate provides the two
//! interchangeable ways of doing that, both backed by an embedded Lua 5.4
//! interpreter:
//!
//! - [`SignatureLoader`] finds the first `function name(params)` declaration,
//!   takes its parameter list up to the first `)` and its body between the
//!   first `{` and the last `}`, and compiles those as a Lua closure.
//! - [`ModuleLoader`] runs the whole source as a module chunk and calls an
//!   exported entry point (`handler` by default) for each request.
//!
//! Nothing here sandboxes the submitted code. The worker trusts its input.
//!
//! # Example
//!
//! ```
//! use funcworker_loader::{FunctionLoader, SignatureLoader};
//!
//! let unit = SignatureLoader
//!     .load("function id(x){ return x }")
//!     .expect("valid declaration");
//! let result = unit.invoke(&serde_json::json!(42)).expect("identity succeeds");
//! assert_eq!(result, serde_json::json!(42));
//! ```

pub mod error;
mod interpreter;
pub mod module;
pub mod signature;

#[cfg(test)]
mod tests;

use funcworker_config::ConversionStrategy;
use serde_json::Value;

pub use self::error::{ConversionError, InvocationError};
pub use self::module::ModuleLoader;
pub use self::signature::{Signature, SignatureLoader, extract_signature};

/// A loaded function the worker can call once per request.
pub trait Invocable {
    /// Calls the function with `argument` as its only argument.
    ///
    /// # Errors
    ///
    /// Returns an [`InvocationError`] when the argument cannot be passed in,
    /// the function raises, or its result cannot be expressed as JSON.
    fn invoke(&self, argument: &Value) -> Result<Value, InvocationError>;
}

/// Turns source text into an [`Invocable`].
pub trait FunctionLoader {
    /// Converts `source` into a callable unit.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the source does not describe a
    /// usable function.
    fn load(&self, source: &str) -> Result<Box<dyn Invocable>, ConversionError>;
}

impl<T: FunctionLoader + ?Sized> FunctionLoader for Box<T> {
    fn load(&self, source: &str) -> Result<Box<dyn Invocable>, ConversionError> {
        (**self).load(source)
    }
}

/// Builds the loader for a configured strategy.
///
/// `entry_point` only matters for [`ConversionStrategy::Module`].
#[must_use]
pub fn loader_for(strategy: ConversionStrategy, entry_point: &str) -> Box<dyn FunctionLoader> {
    match strategy {
        ConversionStrategy::Signature => Box::new(SignatureLoader),
        ConversionStrategy::Module => Box::new(ModuleLoader::new(entry_point)),
    }
}
