//! Conversion by module compilation.
//!
//! The whole source runs once as a chunk in a fresh environment that falls
//! back to the interpreter's globals. The chunk can publish its exports in
//! any of three ways, checked in this order:
//!
//! 1. returning a value;
//! 2. assigning or filling `module.exports`;
//! 3. filling the `exports` table directly.
//!
//! The first candidate that is neither `nil` nor an empty table becomes the
//! export surface, whatever its type. The entry point is looked up in that
//! surface on every invocation rather than at load time, so a module that
//! exports something other than the entry point (or a bare function) still
//! loads and only fails when a request arrives.

use mlua::{Lua, Table, Value};
use serde_json::Value as Json;
use tracing::debug;

use crate::error::{ConversionError, InvocationError};
use crate::interpreter::{LOADER_TARGET, call_with_json, new_interpreter};
use crate::{FunctionLoader, Invocable};

/// Builds a module environment with `exports` and `module.exports` bound to
/// the same table and global lookups falling through to `_G`.
const ENVIRONMENT_CHUNK: &str = "\
local exports = {}
return setmetatable(
  { exports = exports, module = { exports = exports } },
  { __index = _G }
)";

/// Loads functions by running the source as a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLoader {
    entry_point: String,
}

impl ModuleLoader {
    /// Creates a loader that calls the export named `entry_point`.
    #[must_use]
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }

    /// Returns the export name invoked for each request.
    #[must_use]
    pub const fn entry_point(&self) -> &str {
        self.entry_point.as_str()
    }
}

impl FunctionLoader for ModuleLoader {
    fn load(&self, source: &str) -> Result<Box<dyn Invocable>, ConversionError> {
        let lua = new_interpreter()?;
        let environment: Table = lua
            .load(ENVIRONMENT_CHUNK)
            .set_name("=module-environment")
            .eval()
            .map_err(ConversionError::interpreter)?;

        let chunk = lua
            .load(source)
            .set_name("=module")
            .set_environment(environment.clone())
            .into_function()
            .map_err(ConversionError::compile)?;
        let returned: Value = chunk.call(()).map_err(ConversionError::execute)?;

        let exports = export_surface(&environment, returned)
            .map_err(ConversionError::execute)?
            .ok_or(ConversionError::NoExports)?;
        debug!(
            target: LOADER_TARGET,
            entry_point = %self.entry_point,
            "loaded module"
        );
        Ok(Box::new(ModuleFunction {
            exports,
            entry_point: self.entry_point.clone(),
            lua,
        }))
    }
}

fn export_surface(environment: &Table, returned: Value) -> mlua::Result<Option<Value>> {
    if let Some(exports) = present(returned)? {
        return Ok(Some(exports));
    }
    if let Value::Table(module) = environment.raw_get::<Value>("module")?
        && let Some(exports) = present(module.raw_get("exports")?)?
    {
        return Ok(Some(exports));
    }
    present(environment.raw_get("exports")?)
}

/// `nil` and empty tables count as absent; every other value is a surface.
fn present(value: Value) -> mlua::Result<Option<Value>> {
    match value {
        Value::Nil => Ok(None),
        Value::Table(table) => {
            let first = table.pairs::<Value, Value>().next().transpose()?;
            Ok(first.map(|_| Value::Table(table)))
        }
        other => Ok(Some(other)),
    }
}

/// A loaded module whose entry point is resolved per call.
struct ModuleFunction {
    exports: Value,
    entry_point: String,
    lua: Lua,
}

impl ModuleFunction {
    fn missing_entry_point(&self) -> InvocationError {
        InvocationError::MissingEntryPoint {
            name: self.entry_point.clone(),
        }
    }
}

impl Invocable for ModuleFunction {
    fn invoke(&self, argument: &Json) -> Result<Json, InvocationError> {
        let Value::Table(exports) = &self.exports else {
            return Err(self.missing_entry_point());
        };
        let entry: Value = exports
            .get(self.entry_point.as_str())
            .map_err(InvocationError::raised)?;
        let Value::Function(function) = entry else {
            return Err(self.missing_entry_point());
        };
        call_with_json(&self.lua, &function, argument)
    }
}
