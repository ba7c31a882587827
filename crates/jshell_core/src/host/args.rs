//! Argument access and validation for native bindings.
//!
//! Every failed check produces an engine error the script sees as an
//! exception; no binding code after a failed check runs. Error messages are
//! stable, scripts and tests match on them.

use boa_engine::object::builtins::JsArray;
use boa_engine::object::{JsObject, NativeObject};
use boa_engine::{Context, JsArgs, JsError, JsNativeError, JsResult, JsValue};

/// Builds a type error with the given message.
pub fn type_error(message: impl Into<String>) -> JsError {
    JsNativeError::typ().with_message(message.into()).into()
}

/// Builds a range error with the given message.
pub fn range_error(message: impl Into<String>) -> JsError {
    JsNativeError::range().with_message(message.into()).into()
}

/// Builds a generic host error with the given message.
pub fn host_error(message: impl Into<String>) -> JsError {
    JsNativeError::error().with_message(message.into()).into()
}

/// Fixed message for exhausted memory.
pub fn out_of_memory_error() -> JsError {
    host_error("Out of memory")
}

/// Fixed message for a non-array where an array is required.
pub fn array_expected_error() -> JsError {
    type_error("Array expected")
}

/// Fixed message for an index outside the valid range.
pub fn index_out_of_bound_error(index: i64) -> JsError {
    range_error(format!("Index out of bound ({index})"))
}

/// Checks that a numeric value is not negative.
///
/// The error message carries the offending value.
pub fn non_negative(value: f64) -> JsResult<f64> {
    if value < 0.0 {
        return Err(range_error(format!(
            "Non negative number expected: {}",
            value as i64
        )));
    }
    Ok(value)
}

/// Converts the argument at `index` to a number.
pub fn number_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<f64> {
    args.get_or_undefined(index).to_number(context)
}

/// Converts the argument at `index` to a non-negative number.
pub fn non_negative_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<f64> {
    non_negative(number_arg(args, index, context)?)
}

/// Converts the argument at `index` to a host string.
pub fn string_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    Ok(args
        .get_or_undefined(index)
        .to_string(context)?
        .to_std_string_escaped())
}

/// Requires the argument at `index` to be an array.
pub fn array_arg(args: &[JsValue], index: usize) -> JsResult<JsArray> {
    let value = args.get_or_undefined(index);
    let Some(object) = value.as_object() else {
        return Err(array_expected_error());
    };
    JsArray::from_object(object.clone()).map_err(|_| array_expected_error())
}

/// Requires the argument at `index` to carry host-native data of type `T`.
///
/// On mismatch the error message is exactly `"<tag> expected"` and the
/// calling binding returns before touching the argument.
pub fn native_arg<T: NativeObject>(args: &[JsValue], index: usize, tag: &str) -> JsResult<JsObject> {
    let value = args.get_or_undefined(index);
    if let Some(object) = value.as_object() {
        if object.downcast_ref::<T>().is_some() {
            return Ok(object.clone());
        }
    }
    Err(type_error(format!("{tag} expected")))
}

/// Requires the method receiver to carry host-native data of type `T`.
///
/// The receiver occupies argument position zero in the engine's calling
/// convention, so this is [`native_arg`] applied to `this`.
pub fn native_this<T: NativeObject>(this: &JsValue, tag: &str) -> JsResult<JsObject> {
    native_arg::<T>(std::slice::from_ref(this), 0, tag)
}
