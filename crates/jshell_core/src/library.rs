//! Registry of loaded native extension libraries.
//!
//! # Responsibility
//! - Record every loaded native library with its handle and shutdown hook.
//! - Answer duplicate-load probes before a library is loaded again.
//!
//! # Invariants
//! - Records are append-only and keep registration order.
//! - A registered name is never displaced by a later registration attempt.
//! - Shutdown hooks run at most once, in reverse registration order.

use log::info;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque handle of a loaded native library.
///
/// The registry never interprets the handle; it keeps it alive for the
/// process lifetime on behalf of the loader.
pub type LibraryHandle = Box<dyn Any>;

/// Teardown callback supplied at registration time.
pub type ShutdownHook = Box<dyn FnOnce()>;

/// One registered native library.
pub struct RegisteredLibrary {
    name: String,
    handle: LibraryHandle,
    shutdown: Option<ShutdownHook>,
}

impl RegisteredLibrary {
    /// Returns the registered library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the opaque handle stored for this library.
    pub fn handle(&self) -> &dyn Any {
        self.handle.as_ref()
    }
}

/// Process-lifetime registry of loaded native libraries.
///
/// Owned by the host context; there is no global registry state.
#[derive(Default)]
pub struct LibraryRegistry {
    entries: Vec<RegisteredLibrary>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one loaded library.
    ///
    /// # Errors
    /// - `LibraryRegistryError::InvalidLibraryName` for empty or malformed
    ///   names.
    /// - `LibraryRegistryError::DuplicateLibraryName` when the name is
    ///   already registered; the earlier entry is retained untouched.
    pub fn register(
        &mut self,
        name: &str,
        handle: LibraryHandle,
        shutdown: Option<ShutdownHook>,
    ) -> Result<(), LibraryRegistryError> {
        let name = name.trim();
        if !is_valid_library_name(name) {
            return Err(LibraryRegistryError::InvalidLibraryName(name.to_string()));
        }
        if self.contains(name) {
            return Err(LibraryRegistryError::DuplicateLibraryName(name.to_string()));
        }

        info!("event=library_register module=library status=ok name={name}");
        self.entries.push(RegisteredLibrary {
            name: name.to_string(),
            handle,
            shutdown,
        });
        Ok(())
    }

    /// Reports whether a library with this name is already registered.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Returns the stored handle for one library.
    pub fn handle(&self, name: &str) -> Option<&dyn Any> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(RegisteredLibrary::handle)
    }

    /// Returns library names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(RegisteredLibrary::name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every shutdown hook in reverse registration order and drains the
    /// registry.
    ///
    /// Libraries registered first are torn down last, so a library can rely
    /// on anything it itself required at load time. Calling this twice is a
    /// no-op the second time.
    pub fn shutdown_all(&mut self) {
        for mut entry in self.entries.drain(..).rev() {
            if let Some(hook) = entry.shutdown.take() {
                info!(
                    "event=library_shutdown module=library status=ok name={}",
                    entry.name
                );
                hook();
            }
        }
    }
}

impl std::fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn is_valid_library_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Library registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryRegistryError {
    InvalidLibraryName(String),
    DuplicateLibraryName(String),
}

impl Display for LibraryRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLibraryName(value) => write!(f, "library name is invalid: `{value}`"),
            Self::DuplicateLibraryName(value) => {
                write!(f, "library already registered: {value}")
            }
        }
    }
}

impl Error for LibraryRegistryError {}

#[cfg(test)]
mod tests {
    use super::{LibraryRegistry, LibraryRegistryError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn registers_two_libraries_and_finds_both() {
        let mut registry = LibraryRegistry::new();
        registry
            .register("curses", Box::new(1u32), None)
            .expect("first registration");
        registry
            .register("png", Box::new(2u32), None)
            .expect("second registration");

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("curses"));
        assert!(registry.contains("png"));
        assert_eq!(registry.names(), vec!["curses", "png"]);
    }

    #[test]
    fn reports_absent_for_unregistered_name() {
        let registry = LibraryRegistry::new();
        assert!(!registry.contains("curses"));
        assert!(registry.handle("curses").is_none());
    }

    #[test]
    fn duplicate_registration_keeps_earlier_entry() {
        let mut registry = LibraryRegistry::new();
        registry
            .register("curses", Box::new(1u32), None)
            .expect("first registration");

        let err = registry
            .register("curses", Box::new(2u32), None)
            .expect_err("duplicate must be rejected");
        assert!(matches!(
            err,
            LibraryRegistryError::DuplicateLibraryName(_)
        ));

        assert_eq!(registry.len(), 1);
        let handle = registry.handle("curses").expect("earlier entry survives");
        assert_eq!(handle.downcast_ref::<u32>(), Some(&1u32));
    }

    #[test]
    fn rejects_invalid_names() {
        let mut registry = LibraryRegistry::new();
        for name in ["", "   ", "bad name", "tab\tname"] {
            let err = registry
                .register(name, Box::new(()), None)
                .expect_err("invalid name must be rejected");
            assert!(matches!(err, LibraryRegistryError::InvalidLibraryName(_)));
        }
    }

    #[test]
    fn shutdown_runs_hooks_in_reverse_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = LibraryRegistry::new();
        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            registry
                .register(name, Box::new(()), Some(Box::new(move || {
                    order.borrow_mut().push(name);
                })))
                .expect("registration");
        }

        registry.shutdown_all();
        assert_eq!(*order.borrow(), vec!["third", "second", "first"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn shutdown_twice_runs_hooks_once() {
        let calls = Rc::new(RefCell::new(0u32));
        let mut registry = LibraryRegistry::new();
        let counter = Rc::clone(&calls);
        registry
            .register("once", Box::new(()), Some(Box::new(move || {
                *counter.borrow_mut() += 1;
            })))
            .expect("registration");

        registry.shutdown_all();
        registry.shutdown_all();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn libraries_without_hooks_shut_down_cleanly() {
        let mut registry = LibraryRegistry::new();
        registry
            .register("plain", Box::new(()), None)
            .expect("registration");
        registry.shutdown_all();
        assert!(registry.is_empty());
    }
}
