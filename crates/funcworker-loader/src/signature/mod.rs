//! Conversion by signature extraction.
//!
//! The source is scanned for its first named declaration,
//! `function name(params) { body }`. Parameters are everything up to the
//! first `)` after the declaration, stripped of whitespace and split on
//! commas. The body is everything between the first `{` and the last `}`
//! after that `)`. The pieces are recompiled as an anonymous Lua closure:
//!
//! ```text
//! return function(<params joined by ", ">)
//! <body>
//! end
//! ```
//!
//! The extraction is deliberately shallow. A nested `)` inside the parameter
//! list truncates it, and anything outside the outermost braces is dropped.

use mlua::{Function, Lua};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConversionError, InvocationError};
use crate::interpreter::{LOADER_TARGET, call_with_json, new_interpreter};
use crate::{FunctionLoader, Invocable};

#[expect(
    clippy::expect_used,
    reason = "the declaration pattern is a compile-time constant"
)]
static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunction\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(")
        .expect("declaration pattern must compile")
});

/// Pieces of a named function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Declared name. Only used for diagnostics.
    pub name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// Text between the outermost braces.
    pub body: String,
}

impl Signature {
    /// Renders the closure chunk the interpreter compiles.
    #[must_use]
    pub fn to_chunk(&self) -> String {
        let mut chunk = String::from("return function(");
        chunk.push_str(&self.params.join(", "));
        chunk.push_str(")\n");
        chunk.push_str(&self.body);
        chunk.push_str("\nend");
        chunk
    }
}

/// Splits source text into a [`Signature`].
///
/// # Errors
///
/// Returns [`ConversionError::MissingDeclaration`] when no
/// `function name(` appears, [`ConversionError::UnterminatedParameters`]
/// when no `)` follows it, and [`ConversionError::MissingBody`] when no
/// `{ ... }` pair follows the parameters.
///
/// # Example
///
/// ```
/// use funcworker_loader::extract_signature;
///
/// let signature = extract_signature("function add(a, b){ return a + b }")
///     .expect("declaration is well formed");
/// assert_eq!(signature.name, "add");
/// assert_eq!(signature.params, ["a", "b"]);
/// assert_eq!(signature.body, " return a + b ");
/// ```
pub fn extract_signature(source: &str) -> Result<Signature, ConversionError> {
    let captures = DECLARATION
        .captures(source)
        .ok_or(ConversionError::MissingDeclaration)?;
    let (Some(declaration), Some(declared)) = (captures.get(0), captures.get(1)) else {
        return Err(ConversionError::MissingDeclaration);
    };
    let name = declared.as_str().to_owned();

    let after_open = source.get(declaration.end()..).unwrap_or_default();
    let Some((raw_params, after_close)) = after_open.split_once(')') else {
        return Err(ConversionError::UnterminatedParameters { name });
    };
    let Some(body) = braced_body(after_close) else {
        return Err(ConversionError::MissingBody { name });
    };

    Ok(Signature {
        params: split_params(raw_params),
        body: body.to_owned(),
        name,
    })
}

fn split_params(raw: &str) -> Vec<String> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return Vec::new();
    }
    compact.split(',').map(str::to_owned).collect()
}

fn braced_body(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let close = text.rfind('}')?;
    if close <= open {
        return None;
    }
    text.get(open + 1..close)
}

/// Loads functions by [signature extraction](self).
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureLoader;

impl FunctionLoader for SignatureLoader {
    fn load(&self, source: &str) -> Result<Box<dyn Invocable>, ConversionError> {
        let signature = extract_signature(source)?;
        let lua = new_interpreter()?;
        let function: Function = lua
            .load(signature.to_chunk())
            .set_name(format!("={}", signature.name))
            .eval()
            .map_err(ConversionError::compile)?;
        debug!(
            target: LOADER_TARGET,
            name = %signature.name,
            params = signature.params.len(),
            "compiled function from signature"
        );
        Ok(Box::new(CompiledFunction { function, lua }))
    }
}

/// A closure compiled from an extracted signature.
struct CompiledFunction {
    function: Function,
    lua: Lua,
}

impl Invocable for CompiledFunction {
    fn invoke(&self, argument: &Value) -> Result<Value, InvocationError> {
        call_with_json(&self.lua, &self.function, argument)
    }
}
