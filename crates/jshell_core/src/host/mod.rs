//! Engine host: the embedding boundary between the shell and the engine.
//!
//! # Responsibility
//! - Own the engine context and the host state shared with native bindings.
//! - Execute script files and map their outcome to an integer status.
//!
//! # Invariants
//! - Single-threaded and synchronous: every binding call blocks and no host
//!   state is shared across threads.
//! - Script-visible failures surface as engine exceptions; host failures
//!   surface as `HostError`.

pub mod args;
pub mod register;

use crate::boot::resolve_boot_location;
use crate::config::HostConfig;
use crate::library::{LibraryHandle, LibraryRegistry, LibraryRegistryError, ShutdownHook};
use boa_engine::{Context, JsValue, Source};
use boa_gc::{empty_trace, Finalize, Trace};
use log::{error, info, warn};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

/// Status returned when the script finished without a termination request.
pub const STATUS_OK: i32 = 0;
/// Status returned when the script died with an uncaught exception.
pub const STATUS_SCRIPT_ERROR: i32 = 1;

/// Host-side state shared with native bindings.
///
/// Bindings reach it through a shared handle captured at registration time;
/// the engine context itself never stores host data.
pub struct HostState {
    pub config: HostConfig,
    /// Resolved boot script directory; `None` when discovery failed.
    pub boot_dir: Option<PathBuf>,
    pub libraries: LibraryRegistry,
    /// Exit status requested by the script, honored after evaluation.
    pub exit_request: Option<i32>,
    /// Names of modules currently being loaded, for cycle detection.
    pub module_stack: Vec<String>,
    pub started_at: Instant,
}

pub type SharedHostState = Rc<RefCell<HostState>>;

/// Capture wrapper handing the shared host state to native bindings.
///
/// The state holds no engine values, so there is nothing to trace.
#[derive(Finalize)]
pub(crate) struct StateCapture {
    pub state: SharedHostState,
}

unsafe impl Trace for StateCapture {
    empty_trace!();
}

/// The shell's engine instance.
pub struct ScriptHost {
    context: Context,
    state: SharedHostState,
}

impl ScriptHost {
    /// Creates a host with boot discovery anchored at the working directory.
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let base_dir = std::env::current_dir().map_err(HostError::CurrentDir)?;
        Self::with_base_dir(config, &base_dir)
    }

    /// Creates a host with boot discovery anchored at `base_dir`.
    ///
    /// A missing boot location is logged and leaves module loading
    /// unavailable; it does not fail host construction.
    pub fn with_base_dir(config: HostConfig, base_dir: &Path) -> Result<Self, HostError> {
        let boot_dir = match resolve_boot_location(config.boot_path.as_deref(), base_dir) {
            Ok(dir) => {
                info!(
                    "event=boot_resolve module=host status=ok dir={}",
                    dir.display()
                );
                Some(dir)
            }
            Err(err) => {
                warn!("event=boot_resolve module=host status=missing error={err}");
                None
            }
        };

        let network = !config.no_network;
        let state = Rc::new(RefCell::new(HostState {
            config,
            boot_dir,
            libraries: LibraryRegistry::new(),
            exit_request: None,
            module_stack: Vec::new(),
            started_at: Instant::now(),
        }));

        let mut context = Context::default();
        crate::builtins::install_all(&mut context, &state)
            .map_err(|err| HostError::EngineSetup(err.to_string()))?;

        info!(
            "event=host_init module=host status=ok version={} network={network}",
            crate::core_version()
        );
        Ok(Self { context, state })
    }

    /// Executes a script file and returns its integer status.
    ///
    /// Status mapping:
    /// - `0` when the script completed normally,
    /// - the requested code when the script asked the shell to stop,
    /// - `1` when an uncaught exception ended the script (logged).
    ///
    /// A leading `#!` interpreter line is skipped.
    ///
    /// # Errors
    /// - `HostError::ScriptRead` when the file cannot be read.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<i32, HostError> {
        let path = path.as_ref();
        let source_text =
            std::fs::read_to_string(path).map_err(|source| HostError::ScriptRead {
                path: path.to_path_buf(),
                source,
            })?;
        let body = skip_interpreter_line(&source_text);

        info!(
            "event=script_run module=host status=start path={}",
            path.display()
        );
        let outcome = self.context.eval(Source::from_bytes(body.as_bytes()));
        let requested_exit = self.state.borrow_mut().exit_request.take();

        match outcome {
            Ok(_) => {
                let status = requested_exit.unwrap_or(STATUS_OK);
                info!(
                    "event=script_run module=host status=ok path={} exit={status}",
                    path.display()
                );
                Ok(status)
            }
            // A termination request unwinds evaluation with an exception;
            // the requested status wins over the error mapping.
            Err(_) if requested_exit.is_some() => {
                let status = requested_exit.unwrap_or(STATUS_OK);
                info!(
                    "event=script_run module=host status=stopped path={} exit={status}",
                    path.display()
                );
                Ok(status)
            }
            Err(err) => {
                error!(
                    "event=script_run module=host status=error path={} error={err}",
                    path.display()
                );
                Ok(STATUS_SCRIPT_ERROR)
            }
        }
    }

    /// Evaluates a source snippet directly.
    ///
    /// Intended for embedders and tests; errors are stringified at this
    /// boundary.
    pub fn eval(&mut self, code: &str) -> Result<JsValue, String> {
        self.context
            .eval(Source::from_bytes(code.as_bytes()))
            .map_err(|err| format!("{err}"))
    }

    /// Registers a loaded native library in the host registry.
    pub fn register_library(
        &self,
        name: &str,
        handle: LibraryHandle,
        shutdown: Option<ShutdownHook>,
    ) -> Result<(), LibraryRegistryError> {
        self.state
            .borrow_mut()
            .libraries
            .register(name, handle, shutdown)
    }

    /// Reports whether a native library is already registered.
    pub fn has_library(&self, name: &str) -> bool {
        self.state.borrow().libraries.contains(name)
    }

    /// Runs registered library shutdown hooks and flushes the log.
    ///
    /// Called automatically on drop; exposed for hosts that want teardown at
    /// a deterministic point.
    pub fn shutdown(&mut self) {
        self.state.borrow_mut().libraries.shutdown_all();
        crate::logging::flush_log();
    }

    /// Direct access to the engine context for embedders installing their
    /// own bindings.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Returns the script body with a leading `#!` line blanked out.
///
/// The first newline is kept so line numbers in engine errors still match
/// the file.
pub(crate) fn skip_interpreter_line(source: &str) -> &str {
    if source.starts_with("#!") {
        match source.find('\n') {
            Some(position) => &source[position..],
            None => "",
        }
    } else {
        source
    }
}

/// Host-side failures around script execution.
#[derive(Debug)]
pub enum HostError {
    CurrentDir(std::io::Error),
    EngineSetup(String),
    ScriptRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentDir(source) => {
                write!(f, "cannot determine working directory: {source}")
            }
            Self::EngineSetup(message) => write!(f, "engine setup failed: {message}"),
            Self::ScriptRead { path, source } => {
                write!(f, "cannot read script `{}`: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CurrentDir(source) => Some(source),
            Self::EngineSetup(_) => None,
            Self::ScriptRead { source, .. } => Some(source),
        }
    }
}
