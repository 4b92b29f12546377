//! Error taxonomy for CurioScript.
//!
//! Lex and parse errors abort before any evaluation; runtime errors abort the
//! remainder of the run immediately.  Nothing is recovered internally and
//! side effects already performed by host handlers are not rolled back; the
//! host receives exactly one terminal [`ScriptError`].

use thiserror::Error;

use crate::lexer::Pos;

/// Error type produced by a host command handler.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// Bad character, unterminated string or block comment.
    #[error("{pos}: {message}")]
    Lex { message: String, pos: Pos },

    /// Unexpected token; `expected` lists the alternatives the grammar
    /// allowed at this point.
    #[error("{pos}: expected {expected}, found {found}")]
    Parse {
        expected: String,
        found: String,
        pos: Pos,
    },

    /// Identifier lookup walked the whole scope chain without a hit.
    #[error("{pos}: undefined variable `{name}`")]
    UndefinedVariable { name: String, pos: Pos },

    /// The registry (and the builtin table) had no handler for this name.
    #[error("{pos}: unknown command `{name}`")]
    UnknownCommand { name: String, pos: Pos },

    /// Operand, condition, iterable, or call result of the wrong variant.
    #[error("{pos}: {message}")]
    Type { message: String, pos: Pos },

    #[error("{pos}: division by zero")]
    DivisionByZero { pos: Pos },

    /// `pop` on an empty context stack.
    #[error("{pos}: pop on empty context stack")]
    StackUnderflow { pos: Pos },

    /// A host handler (or builtin) failed; the cause is preserved.
    #[error("{pos}: command `{name}` failed: {cause}")]
    Command {
        name: String,
        pos: Pos,
        #[source]
        cause: HostError,
    },

    /// Out-of-range list index or missing map key.
    #[error("{pos}: {message}")]
    Index { message: String, pos: Pos },

    /// The configured execution budget ran out.
    #[error("execution budget exceeded: used {used} of {limit}")]
    BudgetExceeded { used: u64, limit: u64 },
}

impl ScriptError {
    /// Source position of the failure, when one applies.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            ScriptError::Lex { pos, .. }
            | ScriptError::Parse { pos, .. }
            | ScriptError::UndefinedVariable { pos, .. }
            | ScriptError::UnknownCommand { pos, .. }
            | ScriptError::Type { pos, .. }
            | ScriptError::DivisionByZero { pos }
            | ScriptError::StackUnderflow { pos }
            | ScriptError::Command { pos, .. }
            | ScriptError::Index { pos, .. } => Some(*pos),
            ScriptError::BudgetExceeded { .. } => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
