//! Builtin script surface installed on every host.
//!
//! Each submodule owns one family of bindings and exposes a single
//! `install` entry; the host calls [`install_all`] once during setup.

pub mod file;
pub mod global;

use crate::host::SharedHostState;
use boa_engine::{Context, JsResult};

pub use file::{FileHandle, FILE_TAG};
pub use global::{SHELL_VERSION, SHELL_VERSION_STR};

pub(crate) fn install_all(context: &mut Context, state: &SharedHostState) -> JsResult<()> {
    global::install(context, state)?;
    file::install(context)?;
    Ok(())
}
