//! CurioScript: a small scripting language for driving a UI layer headlessly.
//!
//! A test harness issues scripted commands instead of simulating real widget
//! events.  This crate implements the language core, covering:
//!
//! - Assignments, command invocations, `if`/`else`, `foreach`
//! - An explicit context stack (`push` / `pop`)
//! - Strictly typed expressions with C-like operator precedence
//! - A host-supplied [`CommandRegistry`] as the only way scripts reach the
//!   outside world, plus a standard builtin function library
//! - An optional execution budget so runaway scripts burn out early
//!
//! The host application itself (rendering, controllers, persistence) is out
//! of scope; the interpreter only ever sees it through registered handlers.
//!
//! # Quick start
//!
//! ```rust
//! use curio::{CommandRegistry, Interpreter, Value};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register("items", |_args| {
//!     Ok(Some(Value::List(vec![
//!         Value::Num(1.0),
//!         Value::Num(2.0),
//!         Value::Num(3.0),
//!     ])))
//! });
//!
//! let mut interp = Interpreter::new(registry);
//! interp.run_script("foreach (v in items()) push v").unwrap();
//! assert_eq!(interp.stack().len(), 3);
//! ```

pub mod ast;
pub mod builtins;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

// Re-exports for convenience.
pub use error::{HostError, ScriptError};
pub use interp::Interpreter;
pub use lexer::Pos;
pub use parser::{parse, parse_expr};
pub use registry::CommandRegistry;
pub use value::{HostObject, Value};
