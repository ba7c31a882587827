//! File access for scripts: the `File` class with line, string and byte
//! operations. Every method verifies the receiver tag before touching any
//! state; a closed handle fails every operation instead of reopening.

use crate::host::args::{
    array_arg, host_error, index_out_of_bound_error, native_this, non_negative_arg,
    out_of_memory_error, range_error, string_arg, type_error,
};
use crate::host::register::NativeClassSpec;
use boa_engine::object::builtins::JsArray;
use boa_engine::object::JsObject;
use boa_engine::{Context, JsData, JsError, JsResult, JsString, JsValue, NativeFunction};
use boa_gc::{empty_trace, Finalize, Trace};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;

/// Type tag used in receiver-check error messages.
pub const FILE_TAG: &str = "File";

pub(crate) fn install(context: &mut Context) -> JsResult<()> {
    NativeClassSpec::new(FILE_TAG, 2)
        .method("ReadLine", 0, NativeFunction::from_fn_ptr(file_read_line))
        .method("ReadBytes", 1, NativeFunction::from_fn_ptr(file_read_bytes))
        .method(
            "WriteString",
            1,
            NativeFunction::from_fn_ptr(file_write_string),
        )
        .method(
            "WriteBytes",
            1,
            NativeFunction::from_fn_ptr(file_write_bytes),
        )
        .method("Close", 0, NativeFunction::from_fn_ptr(file_close))
        .register(context, construct_file)?;
    Ok(())
}

/// Host-native data behind one `File` instance.
#[derive(Debug, Finalize, JsData)]
pub struct FileHandle {
    path: PathBuf,
    backend: RefCell<FileBackend>,
}

unsafe impl Trace for FileHandle {
    empty_trace!();
}

#[derive(Debug)]
enum FileBackend {
    Read(BufReader<File>),
    Write(File),
    Closed,
}

impl FileHandle {
    fn closed_error(&self) -> JsError {
        host_error(format!("`{}` is closed", self.path.display()))
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> JsError {
        host_error(format!("cannot {action} `{}`: {err}", self.path.display()))
    }

    fn read_line(&self) -> JsResult<JsValue> {
        let mut backend = self.backend.borrow_mut();
        let reader = match &mut *backend {
            FileBackend::Read(reader) => reader,
            FileBackend::Write(_) => {
                return Err(host_error(format!(
                    "`{}` is not open for reading",
                    self.path.display()
                )))
            }
            FileBackend::Closed => return Err(self.closed_error()),
        };

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|err| self.io_error("read", err))?;
        if read == 0 {
            return Ok(JsValue::null());
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(JsValue::from(JsString::from(line.as_str())))
    }

    fn read_bytes(&self, count: usize) -> JsResult<Vec<u8>> {
        let mut backend = self.backend.borrow_mut();
        let reader = match &mut *backend {
            FileBackend::Read(reader) => reader,
            FileBackend::Write(_) => {
                return Err(host_error(format!(
                    "`{}` is not open for reading",
                    self.path.display()
                )))
            }
            FileBackend::Closed => return Err(self.closed_error()),
        };

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(count)
            .map_err(|_| out_of_memory_error())?;
        reader
            .by_ref()
            .take(count as u64)
            .read_to_end(&mut buffer)
            .map_err(|err| self.io_error("read", err))?;
        Ok(buffer)
    }

    fn write_all(&self, bytes: &[u8]) -> JsResult<()> {
        let mut backend = self.backend.borrow_mut();
        let file = match &mut *backend {
            FileBackend::Write(file) => file,
            FileBackend::Read(_) => {
                return Err(host_error(format!(
                    "`{}` is not open for writing",
                    self.path.display()
                )))
            }
            FileBackend::Closed => return Err(self.closed_error()),
        };
        file.write_all(bytes)
            .map_err(|err| self.io_error("write", err))
    }

    fn close(&self) {
        *self.backend.borrow_mut() = FileBackend::Closed;
    }
}

fn construct_file(
    _this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> JsResult<FileHandle> {
    let path = string_arg(args, 0, context)?;
    let mode = string_arg(args, 1, context)?;

    let open_error =
        |err: std::io::Error| host_error(format!("cannot open `{path}`: {err}"));
    let backend = match mode.as_str() {
        "r" => FileBackend::Read(BufReader::new(File::open(&path).map_err(open_error)?)),
        "w" => FileBackend::Write(File::create(&path).map_err(open_error)?),
        "a" => FileBackend::Write(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .map_err(open_error)?,
        ),
        other => {
            return Err(type_error(format!(
                "unknown file mode `{other}`; expected r|w|a"
            )))
        }
    };

    Ok(FileHandle {
        path: PathBuf::from(path),
        backend: RefCell::new(backend),
    })
}

fn file_data(object: &JsObject) -> JsResult<impl std::ops::Deref<Target = FileHandle> + '_> {
    object
        .downcast_ref::<FileHandle>()
        .ok_or_else(|| type_error(format!("{FILE_TAG} expected")))
}

fn file_read_line(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let object = native_this::<FileHandle>(this, FILE_TAG)?;
    let file = file_data(&object)?;
    file.read_line()
}

fn file_read_bytes(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let object = native_this::<FileHandle>(this, FILE_TAG)?;
    let count = non_negative_arg(args, 0, context)? as usize;
    let bytes = {
        let file = file_data(&object)?;
        file.read_bytes(count)?
    };
    let array = JsArray::from_iter(
        bytes.into_iter().map(|byte| JsValue::from(byte as i32)),
        context,
    );
    Ok(JsValue::from(array))
}

fn file_write_string(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let object = native_this::<FileHandle>(this, FILE_TAG)?;
    let text = string_arg(args, 0, context)?;
    let file = file_data(&object)?;
    file.write_all(text.as_bytes())?;
    Ok(JsValue::undefined())
}

fn file_write_bytes(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let object = native_this::<FileHandle>(this, FILE_TAG)?;
    let array = array_arg(args, 0)?;
    let length = array.length(context)?;

    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(length as usize)
        .map_err(|_| out_of_memory_error())?;
    for index in 0..length {
        let element = array.get(index, context)?;
        if element.is_undefined() {
            return Err(index_out_of_bound_error(index as i64));
        }
        let number = element.to_number(context)?;
        if !(0.0..=255.0).contains(&number) || number.fract() != 0.0 {
            return Err(range_error(format!(
                "byte value out of range at index {index}: {number}"
            )));
        }
        bytes.push(number as u8);
    }

    let file = file_data(&object)?;
    file.write_all(&bytes)?;
    Ok(JsValue::undefined())
}

fn file_close(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let object = native_this::<FileHandle>(this, FILE_TAG)?;
    let file = file_data(&object)?;
    file.close();
    Ok(JsValue::undefined())
}
