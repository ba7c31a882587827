//! Baseline global functions and properties.
//!
//! # Responsibility
//! - Install the shell's always-present script surface: output, timing,
//!   termination, module loading and filesystem probes.
//!
//! # Invariants
//! - `NETWORK_AVAILABLE` mirrors the startup network flag; nothing here
//!   reads process globals.
//! - A termination request never loses the requested status, even when the
//!   script catches the unwinding exception.

use crate::boot::{file_exists, resolve_module};
use crate::host::args::{host_error, non_negative_arg, string_arg};
use crate::host::register::{
    register_global_bool, register_global_function, register_global_number,
    register_global_string,
};
use crate::host::{skip_interpreter_line, SharedHostState, StateCapture};
use boa_engine::object::builtins::JsArray;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsResult, JsString, JsValue, NativeFunction, Source};
use log::{debug, info};
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

/// Script-visible version number.
pub const SHELL_VERSION: f64 = 0.96;
/// Script-visible version string; must render `SHELL_VERSION`.
pub const SHELL_VERSION_STR: &str = "V0.96";

pub(crate) fn install(context: &mut Context, state: &SharedHostState) -> JsResult<()> {
    register_global_function(context, "Print", 1, NativeFunction::from_fn_ptr(js_print))?;
    register_global_function(context, "Println", 1, NativeFunction::from_fn_ptr(js_println))?;
    register_global_function(context, "Sleep", 1, NativeFunction::from_fn_ptr(js_sleep))?;
    register_global_function(context, "Gc", 0, NativeFunction::from_fn_ptr(js_gc))?;
    register_global_function(
        context,
        "FileExists",
        1,
        NativeFunction::from_fn_ptr(js_file_exists),
    )?;
    register_global_function(context, "ReadFile", 1, NativeFunction::from_fn_ptr(js_read_file))?;

    let msec_time = unsafe {
        NativeFunction::from_closure_with_captures(
            |_this, _args, captures, _ctx| {
                let elapsed = captures.state.borrow().started_at.elapsed().as_millis() as f64;
                Ok(JsValue::from(elapsed))
            },
            StateCapture {
                state: Rc::clone(state),
            },
        )
    };
    register_global_function(context, "MSecTime", 0, msec_time)?;

    let quit = unsafe {
        NativeFunction::from_closure_with_captures(js_quit, StateCapture {
            state: Rc::clone(state),
        })
    };
    register_global_function(context, "Quit", 1, quit)?;

    let require = unsafe {
        NativeFunction::from_closure_with_captures(js_require, StateCapture {
            state: Rc::clone(state),
        })
    };
    register_global_function(context, "Require", 1, require)?;

    register_global_number(context, "SHELL_VERSION", SHELL_VERSION)?;
    register_global_string(context, "SHELL_VERSION_STR", SHELL_VERSION_STR)?;

    let (network, script_args) = {
        let state = state.borrow();
        (!state.config.no_network, state.config.script_args.clone())
    };
    register_global_bool(context, "NETWORK_AVAILABLE", network)?;
    info!("event=network_flag module=builtins status=ok available={network}");

    let args_array = JsArray::from_iter(
        script_args
            .iter()
            .map(|value| JsValue::from(JsString::from(value.as_str()))),
        context,
    );
    context.register_global_property(JsString::from("ARGS"), args_array, Attribute::all())?;

    Ok(())
}

fn join_args(args: &[JsValue], context: &mut Context) -> JsResult<String> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_string(context)?.to_std_string_escaped());
    }
    Ok(parts.join(" "))
}

fn js_print(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = join_args(args, context)?;
    print!("{message}");
    let _ = std::io::stdout().flush();
    info!("{message}");
    Ok(JsValue::undefined())
}

fn js_println(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = join_args(args, context)?;
    println!("{message}");
    info!("{message}");
    Ok(JsValue::undefined())
}

fn js_sleep(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let millis = non_negative_arg(args, 0, context)?;
    std::thread::sleep(Duration::from_millis(millis as u64));
    Ok(JsValue::undefined())
}

fn js_gc(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    boa_gc::force_collect();
    Ok(JsValue::undefined())
}

fn js_file_exists(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let path = string_arg(args, 0, context)?;
    Ok(JsValue::from(file_exists(path)))
}

fn js_read_file(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let path = string_arg(args, 0, context)?;
    let contents = std::fs::read_to_string(&path)
        .map_err(|err| host_error(format!("cannot read file `{path}`: {err}")))?;
    Ok(JsValue::from(JsString::from(contents.as_str())))
}

fn js_quit(
    _this: &JsValue,
    args: &[JsValue],
    captures: &StateCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let code = if args.is_empty() || args[0].is_undefined() {
        0
    } else {
        non_negative_arg(args, 0, context)? as i32
    };
    captures.state.borrow_mut().exit_request = Some(code);
    debug!("event=quit_request module=builtins code={code}");
    // Unwind evaluation; the host honors the recorded status afterwards.
    Err(host_error("shell termination requested"))
}

fn js_require(
    _this: &JsValue,
    args: &[JsValue],
    captures: &StateCapture,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(args, 0, context)?;

    let boot_dir = {
        let state = captures.state.borrow();
        if state.module_stack.iter().any(|loading| loading == &name) {
            return Err(host_error(format!("circular module load: `{name}`")));
        }
        state
            .boot_dir
            .clone()
            .ok_or_else(|| host_error(format!("no boot directory available to load `{name}`")))?
    };

    let path = resolve_module(&boot_dir, &name).map_err(|err| host_error(err.to_string()))?;
    let source_text = std::fs::read_to_string(&path)
        .map_err(|err| host_error(format!("cannot read module `{}`: {err}", path.display())))?;
    debug!(
        "event=module_load module=builtins name={name} path={}",
        path.display()
    );

    captures.state.borrow_mut().module_stack.push(name);
    let outcome = eval_module(context, &source_text);
    captures.state.borrow_mut().module_stack.pop();
    outcome
}

/// Evaluates a module body with a fresh `exports` object in scope and
/// returns that object; the previous `exports` binding is restored even when
/// the module throws.
fn eval_module(context: &mut Context, source_text: &str) -> JsResult<JsValue> {
    let global = context.global_object();
    let previous = global.get(JsString::from("exports"), context)?;
    let exports = ObjectInitializer::new(context).build();
    global.set(JsString::from("exports"), exports.clone(), false, context)?;

    let body = skip_interpreter_line(source_text);
    let evaluated = context.eval(Source::from_bytes(body.as_bytes()));
    let restored = global.set(JsString::from("exports"), previous, false, context);

    evaluated?;
    restored?;
    Ok(JsValue::from(exports))
}
