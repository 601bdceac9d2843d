//! Shared interpreter setup and JSON bridging.

use mlua::{Function, Lua, LuaSerdeExt, MultiValue, Table, Value};
use tracing::info;

use crate::error::{ConversionError, InvocationError};

/// Tracing target for output printed by submitted functions.
pub(crate) const USER_TARGET: &str = "funcworker::user";

/// Tracing target for conversion diagnostics.
pub(crate) const LOADER_TARGET: &str = "funcworker::loader";

/// Creates an interpreter whose `print`, `io.write` and `io.stdout:write`
/// go to the log instead of stdout.
///
/// Standard output carries the protocol, so anything a function prints must
/// never reach it.
pub(crate) fn new_interpreter() -> Result<Lua, ConversionError> {
    let lua = Lua::new();
    redirect_output(&lua).map_err(ConversionError::interpreter)?;
    Ok(lua)
}

fn redirect_output(lua: &Lua) -> mlua::Result<()> {
    let print = lua.create_function(|_, values: MultiValue| {
        log_output(&values, "\t");
        Ok(())
    })?;

    let stdout = lua.create_table()?;
    let write_method = lua.create_function(|_, (handle, values): (Table, MultiValue)| {
        log_output(&values, "");
        Ok(handle)
    })?;
    stdout.set("write", write_method)?;

    let handle = stdout.clone();
    let write = lua.create_function(move |_, values: MultiValue| {
        log_output(&values, "");
        Ok(handle.clone())
    })?;

    let globals = lua.globals();
    globals.set("print", print)?;
    let io: Table = globals.get("io")?;
    io.set("write", write)?;
    io.set("stdout", stdout)?;
    Ok(())
}

fn log_output(values: &MultiValue, separator: &str) {
    let line = values
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(separator);
    info!(target: USER_TARGET, output = %line, "function printed");
}

/// Calls `function` with one JSON argument and converts its first result
/// back into JSON.
///
/// A top-level `null` argument arrives as `nil`. Nested nulls keep mlua's
/// null sentinel so arrays keep their length. Integers outside the `i64`
/// range arrive as floats.
pub(crate) fn call_with_json(
    lua: &Lua,
    function: &Function,
    argument: &serde_json::Value,
) -> Result<serde_json::Value, InvocationError> {
    let input = if argument.is_null() {
        Value::Nil
    } else {
        lua.to_value(argument)
            .map_err(|source| InvocationError::Argument { source })?
    };
    let output: Value = function.call(input).map_err(InvocationError::raised)?;
    lua.from_value(output)
        .map_err(|source| InvocationError::Unrepresentable { source })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_owned(),
        Value::Boolean(flag) => flag.to_string(),
        Value::Integer(number) => number.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text
            .to_str()
            .map_or_else(|_| "<invalid utf8>".to_owned(), |text| text.to_string()),
        other => other.type_name().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn compile(lua: &Lua, code: &str) -> Function {
        lua.load(code).eval().expect("test chunk compiles")
    }

    #[rstest]
    #[case::object(json!({"a": 1, "b": "two"}))]
    #[case::array(json!([1, 2, 3]))]
    #[case::string(json!("text"))]
    #[case::boolean(json!(true))]
    #[case::float(json!(1.5))]
    #[case::null(json!(null))]
    #[case::nested_null(json!([1, null, 3]))]
    fn identity_preserves_json_structure(#[case] value: serde_json::Value) {
        let lua = new_interpreter().expect("interpreter");
        let identity = compile(&lua, "return function(x) return x end");
        let result = call_with_json(&lua, &identity, &value).expect("identity");
        assert_eq!(result, value);
    }

    #[test]
    fn nil_result_becomes_null() {
        let lua = new_interpreter().expect("interpreter");
        let nothing = compile(&lua, "return function(x) end");
        let result = call_with_json(&lua, &nothing, &json!(1)).expect("call");
        assert_eq!(result, serde_json::Value::Null);
    }

    #[test]
    fn function_results_are_unrepresentable() {
        let lua = new_interpreter().expect("interpreter");
        let closure = compile(&lua, "return function(x) return function() end end");
        let error = call_with_json(&lua, &closure, &json!(1)).expect_err("function result");
        assert!(matches!(error, InvocationError::Unrepresentable { .. }));
    }

    #[test]
    fn raised_errors_keep_their_message() {
        let lua = new_interpreter().expect("interpreter");
        let failing = compile(&lua, "return function(x) error('boom', 0) end");
        let error = call_with_json(&lua, &failing, &json!(1)).expect_err("raises");
        assert!(
            matches!(&error, InvocationError::Raised { message, .. } if message == "boom"),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn print_does_not_fail_the_call() {
        let lua = new_interpreter().expect("interpreter");
        let noisy = compile(&lua, "return function(x) print('seen', x, nil) return x end");
        let result = call_with_json(&lua, &noisy, &json!(7)).expect("call");
        assert_eq!(result, json!(7));
    }

    #[test]
    fn null_argument_is_nil() {
        let lua = new_interpreter().expect("interpreter");
        let is_nil = compile(&lua, "return function(x) return x == nil end");
        let result = call_with_json(&lua, &is_nil, &json!(null)).expect("call");
        assert_eq!(result, json!(true));
    }

    #[test]
    fn io_write_is_captured() {
        let lua = new_interpreter().expect("interpreter");
        let noisy = compile(
            &lua,
            "return function(x)
               local handle = io.write('junk', 1)
               io.stdout:write('more'):write('again')
               return handle == io.stdout
             end",
        );
        let result = call_with_json(&lua, &noisy, &json!(null)).expect("call");
        assert_eq!(result, json!(true));
    }

    #[rstest]
    #[case(Value::Nil, "nil")]
    #[case(Value::Boolean(true), "true")]
    #[case(Value::Integer(3), "3")]
    #[case(Value::Number(2.5), "2.5")]
    fn scalars_display_like_lua(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(display_value(&value), expected);
    }
}
