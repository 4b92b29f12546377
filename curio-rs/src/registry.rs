//! Host command registry.
//!
//! The registry is the only way a script touches the outside world.  Commands
//! and functions share one namespace and one calling convention; the syntactic
//! position of a call decides whether its result is discarded (statement) or
//! consumed (expression), so a handler simply returns `Ok(None)` when it has
//! nothing to say and `Ok(Some(value))` when it does.
//!
//! Handlers are `FnMut` so a host can close over mutable state (a driver
//! connection, a recorded event log) without interior-mutability ceremony.

use std::collections::HashMap;

use crate::error::HostError;
use crate::value::Value;

/// A host handler: takes the already-evaluated argument values, returns an
/// optional result or a host-defined error.
pub type Handler = Box<dyn FnMut(Vec<Value>) -> Result<Option<Value>, HostError>>;

/// Named table of host handlers.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous registration.
    /// A registration shadows the builtin of the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(Vec<Value>) -> Result<Option<Value>, HostError> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Remove a registration.  Returns `true` if it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Invoke the handler for `name`.  The caller checks [`contains`] first;
    /// a missing name still fails cleanly rather than panicking.
    ///
    /// [`contains`]: CommandRegistry::contains
    pub(crate) fn call(
        &mut self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, HostError> {
        match self.handlers.get_mut(name) {
            Some(handler) => handler(args),
            None => Err(format!("no handler registered for `{name}`").into()),
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CommandRegistry")
            .field("handlers", &names)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
