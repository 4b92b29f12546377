//! CurioScript evaluator.
//!
//! The [`Interpreter`] walks a parsed [`Program`], maintaining a chain of
//! lexically-scoped variable environments and the explicit context stack, and
//! dispatches command/function calls to the host [`CommandRegistry`] (falling
//! back to the builtin table).  Execution is strictly sequential; a statement
//! finishes before the next begins, and any error aborts the rest of the run.
//!
//! Scope rules: one child scope per block, per `if` branch taken, and per
//! `foreach` iteration.  Assignment writes through to the nearest enclosing
//! scope that already defines the name, otherwise it declares in the current
//! scope.  Scopes are torn down unconditionally, including on the error path.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::ast::{BinOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::builtins;
use crate::error::ScriptError;
use crate::lexer::Pos;
use crate::parser::{parse, parse_expr};
use crate::registry::CommandRegistry;
use crate::value::Value;

// ── Execution budget ──────────────────────────────────────────────────────────

/// Operation classes charged against the execution budget.  The weights make
/// host calls an order of magnitude dearer than local work, so a runaway
/// script burns out before it can hammer the host.
#[derive(Debug, Clone, Copy)]
enum Cost {
    Assign,
    VarAccess,
    Arith,
    Compare,
    Logic,
    FnCall,
    CommandCall,
    If,
    ForeachIter,
    Block,
    Stack,
}

impl Cost {
    fn weight(self) -> u64 {
        match self {
            Cost::Assign => 1,
            Cost::VarAccess => 1,
            Cost::Arith => 2,
            Cost::Compare => 2,
            Cost::Logic => 2,
            Cost::FnCall => 5,
            Cost::CommandCall => 10,
            Cost::If => 3,
            Cost::ForeachIter => 5,
            Cost::Block => 1,
            Cost::Stack => 1,
        }
    }
}

#[derive(Debug, Default)]
struct Budget {
    limit: Option<u64>,
    used: u64,
}

impl Budget {
    fn charge(&mut self, cost: Cost) -> Result<(), ScriptError> {
        self.used += cost.weight();
        match self.limit {
            Some(limit) if self.used > limit => {
                Err(ScriptError::BudgetExceeded { used: self.used, limit })
            }
            _ => Ok(()),
        }
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The CurioScript interpreter.
///
/// State (variables, context stack, collected output) persists across
/// [`run_script`] calls so a host can drive a session incrementally; use
/// [`reset`] to start fresh.
///
/// [`run_script`]: Interpreter::run_script
/// [`reset`]: Interpreter::reset
pub struct Interpreter {
    registry: CommandRegistry,
    /// Scope chain, innermost last.  The first entry is the run-global scope
    /// and is never popped.
    scopes: Vec<HashMap<String, Value>>,
    /// The explicit context stack driven by `push`/`pop`.
    ctx_stack: Vec<Value>,
    /// Lines produced by the `print`/`debug` builtins.
    pub output: Vec<String>,
    budget: Budget,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(CommandRegistry::new())
    }
}

impl Interpreter {
    pub fn new(registry: CommandRegistry) -> Self {
        Interpreter {
            registry,
            scopes: vec![HashMap::new()],
            ctx_stack: Vec::new(),
            output: Vec::new(),
            budget: Budget::default(),
        }
    }

    /// Like [`new`](Interpreter::new), with an execution budget.  Each run
    /// may spend at most `limit` cost units before aborting with
    /// [`ScriptError::BudgetExceeded`].
    pub fn with_budget(registry: CommandRegistry, limit: u64) -> Self {
        let mut interp = Self::new(registry);
        interp.budget.limit = Some(limit);
        interp
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// The context stack, bottom first.  Left in place after a run (and after
    /// an error) for host inspection.
    pub fn stack(&self) -> &[Value] {
        &self.ctx_stack
    }

    /// Look up a variable through the scope chain, innermost first.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Seed a variable in the run-global scope before (or between) runs.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.scopes[0].insert(name.into(), value);
    }

    /// Cost units spent by the most recent run.
    pub fn budget_used(&self) -> u64 {
        self.budget.used
    }

    /// Drop all variables, the context stack, and collected output.
    pub fn reset(&mut self) {
        self.scopes = vec![HashMap::new()];
        self.ctx_stack.clear();
        self.output.clear();
        self.budget.used = 0;
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Parse and execute a complete script.
    pub fn run_script(&mut self, src: &str) -> Result<(), ScriptError> {
        let program = parse(src)?;
        self.run_program(&program)
    }

    /// Execute a pre-parsed program.  The budget resets at the start of each
    /// run; variables and the context stack carry over.
    pub fn run_program(&mut self, program: &Program) -> Result<(), ScriptError> {
        self.budget.used = 0;
        for stmt in &program.statements {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    /// Parse and evaluate a single expression against the current state.
    pub fn eval_str(&mut self, src: &str) -> Result<Value, ScriptError> {
        let expr = parse_expr(src)?;
        self.eval_expr(&expr)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        trace!(line = stmt.pos.line, column = stmt.pos.column, "statement");
        match &stmt.kind {
            StmtKind::Assign { name, expr } => {
                self.budget.charge(Cost::Assign)?;
                let value = self.eval_expr(expr)?;
                self.assign(name, value);
                Ok(())
            }

            StmtKind::Command { name, args } => {
                // Result discarded by position.
                self.invoke(name, args, stmt.pos, Cost::CommandCall)?;
                Ok(())
            }

            StmtKind::If { cond, then_branch, else_branch } => {
                self.budget.charge(Cost::If)?;
                let truth = match self.eval_expr(cond)? {
                    Value::Bool(b) => b,
                    other => {
                        return Err(ScriptError::Type {
                            message: format!(
                                "`if` condition must be a boolean, got {}",
                                other.type_name()
                            ),
                            pos: cond.pos,
                        })
                    }
                };
                if truth {
                    self.exec_in_child_scope(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_in_child_scope(else_branch)
                } else {
                    Ok(())
                }
            }

            StmtKind::Foreach { var, iterable, body } => {
                let items = match self.eval_expr(iterable)? {
                    Value::List(items) => items,
                    other => {
                        return Err(ScriptError::Type {
                            message: format!(
                                "`foreach` iterable must be a list, got {}",
                                other.type_name()
                            ),
                            pos: iterable.pos,
                        })
                    }
                };
                for item in items {
                    self.budget.charge(Cost::ForeachIter)?;
                    // Fresh binding per iteration: the loop variable shadows
                    // any outer variable of the same name and dies with the
                    // iteration scope.
                    self.scopes.push(HashMap::new());
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(var.clone(), item);
                    }
                    let result = self.exec_stmt(body);
                    self.scopes.pop();
                    result?;
                }
                Ok(())
            }

            StmtKind::Push { expr } => {
                self.budget.charge(Cost::Stack)?;
                let value = self.eval_expr(expr)?;
                self.ctx_stack.push(value);
                Ok(())
            }

            StmtKind::Pop { target } => {
                self.budget.charge(Cost::Stack)?;
                let value = self
                    .ctx_stack
                    .pop()
                    .ok_or(ScriptError::StackUnderflow { pos: stmt.pos })?;
                if let Some(name) = target {
                    // Bound in the current scope directly, not written
                    // through the chain.
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(name.clone(), value);
                    }
                }
                Ok(())
            }

            StmtKind::Block { statements } => {
                self.budget.charge(Cost::Block)?;
                self.scopes.push(HashMap::new());
                let mut result = Ok(());
                for stmt in statements {
                    result = self.exec_stmt(stmt);
                    if result.is_err() {
                        break;
                    }
                }
                self.scopes.pop();
                result
            }
        }
    }

    /// Run a branch body in its own scope, tearing the scope down even when
    /// the body errors.
    fn exec_in_child_scope(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        self.scopes.push(HashMap::new());
        let result = self.exec_stmt(stmt);
        self.scopes.pop();
        result
    }

    /// Write through to the nearest enclosing scope that defines `name`;
    /// first assignment declares in the current scope.
    fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), value);
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),

            ExprKind::Identifier(name) => {
                self.budget.charge(Cost::VarAccess)?;
                self.get_var(name)
                    .cloned()
                    .ok_or_else(|| ScriptError::UndefinedVariable {
                        name: name.clone(),
                        pos: expr.pos,
                    })
            }

            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                match (*op, value) {
                    (UnaryOp::Neg, Value::Num(n)) => Ok(Value::Num(-n)),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (op, other) => Err(ScriptError::Type {
                        message: format!(
                            "unary `{}` requires a {}, got {}",
                            op.symbol(),
                            match op {
                                UnaryOp::Neg => "number",
                                UnaryOp::Not => "boolean",
                            },
                            other.type_name()
                        ),
                        pos: expr.pos,
                    }),
                }
            }

            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, expr.pos),

            ExprKind::Call { name, args } => {
                let result = self.invoke(name, args, expr.pos, Cost::FnCall)?;
                result.ok_or_else(|| ScriptError::Type {
                    message: format!("function `{name}` did not produce a value"),
                    pos: expr.pos,
                })
            }

            ExprKind::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::List(items))
            }

            ExprKind::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value_expr) in entries {
                    let value = self.eval_expr(value_expr)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Map(map))
            }

            ExprKind::Index { target, index } => {
                let target_value = self.eval_expr(target)?;
                let index_value = self.eval_expr(index)?;
                self.eval_index(target_value, index_value, expr.pos)
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        pos: Pos,
    ) -> Result<Value, ScriptError> {
        // Short-circuit forms first: the right operand is not evaluated when
        // the left already determines the result.
        if matches!(op, BinOp::And | BinOp::Or) {
            self.budget.charge(Cost::Logic)?;
            let lhs = self.bool_operand(op, left)?;
            match (op, lhs) {
                (BinOp::And, false) => return Ok(Value::Bool(false)),
                (BinOp::Or, true) => return Ok(Value::Bool(true)),
                _ => {}
            }
            let rhs = self.bool_operand(op, right)?;
            return Ok(Value::Bool(rhs));
        }

        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
                self.budget.charge(Cost::Arith)?;
                let (a, b) = numeric_operands(op, &lhs, &rhs, pos)?;
                match op {
                    BinOp::Add => Ok(Value::Num(a + b)),
                    BinOp::Sub => Ok(Value::Num(a - b)),
                    BinOp::Mul => Ok(Value::Num(a * b)),
                    BinOp::Div if b == 0.0 => Err(ScriptError::DivisionByZero { pos }),
                    BinOp::Div => Ok(Value::Num(a / b)),
                    BinOp::Rem if b == 0.0 => Err(ScriptError::DivisionByZero { pos }),
                    BinOp::Rem => Ok(Value::Num(a % b)),
                    _ => unreachable!("arithmetic op"),
                }
            }

            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                self.budget.charge(Cost::Compare)?;
                let (a, b) = numeric_operands(op, &lhs, &rhs, pos)?;
                Ok(Value::Bool(match op {
                    BinOp::Lt => a < b,
                    BinOp::Le => a <= b,
                    BinOp::Gt => a > b,
                    BinOp::Ge => a >= b,
                    _ => unreachable!("relational op"),
                }))
            }

            // Same-variant pairs compare structurally (identity for host
            // objects); mismatched variants are simply unequal.
            BinOp::Eq => {
                self.budget.charge(Cost::Compare)?;
                Ok(Value::Bool(lhs == rhs))
            }
            BinOp::Ne => {
                self.budget.charge(Cost::Compare)?;
                Ok(Value::Bool(lhs != rhs))
            }

            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn bool_operand(&mut self, op: BinOp, expr: &Expr) -> Result<bool, ScriptError> {
        match self.eval_expr(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(ScriptError::Type {
                message: format!(
                    "operands of `{}` must be booleans, got {}",
                    op.symbol(),
                    other.type_name()
                ),
                pos: expr.pos,
            }),
        }
    }

    fn eval_index(&self, target: Value, index: Value, pos: Pos) -> Result<Value, ScriptError> {
        match (target, index) {
            (Value::List(items), Value::Num(n)) => {
                if n.fract() != 0.0 || n < 0.0 {
                    return Err(ScriptError::Type {
                        message: format!("list index must be a non-negative integer, got {n}"),
                        pos,
                    });
                }
                let idx = n as usize;
                items.get(idx).cloned().ok_or_else(|| ScriptError::Index {
                    message: format!("list index {idx} out of range (length {})", items.len()),
                    pos,
                })
            }
            (Value::List(_), other) => Err(ScriptError::Type {
                message: format!("list index must be a number, got {}", other.type_name()),
                pos,
            }),
            (Value::Map(entries), Value::Str(key)) => {
                entries.get(&key).cloned().ok_or_else(|| ScriptError::Index {
                    message: format!("key {key:?} not found"),
                    pos,
                })
            }
            (Value::Map(_), other) => Err(ScriptError::Type {
                message: format!("map key must be a string, got {}", other.type_name()),
                pos,
            }),
            (other, _) => Err(ScriptError::Type {
                message: format!("cannot index into {}", other.type_name()),
                pos,
            }),
        }
    }

    // ── Call dispatch ─────────────────────────────────────────────────────────

    /// Shared dispatch path for commands and function calls.  Arguments are
    /// evaluated left to right, then the name is resolved against the host
    /// registry first and the builtin table second.
    fn invoke(
        &mut self,
        name: &str,
        args: &[Expr],
        pos: Pos,
        cost: Cost,
    ) -> Result<Option<Value>, ScriptError> {
        self.budget.charge(cost)?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        debug!(command = name, argc = values.len(), "dispatch");

        if self.registry.contains(name) {
            return self
                .registry
                .call(name, values)
                .map_err(|cause| ScriptError::Command {
                    name: name.to_owned(),
                    pos,
                    cause,
                });
        }
        if builtins::is_builtin(name) {
            return builtins::call_builtin(name, values, &mut self.output).map_err(|message| {
                ScriptError::Command {
                    name: name.to_owned(),
                    pos,
                    cause: message.into(),
                }
            });
        }
        Err(ScriptError::UnknownCommand {
            name: name.to_owned(),
            pos,
        })
    }
}

fn numeric_operands(
    op: BinOp,
    lhs: &Value,
    rhs: &Value,
    pos: Pos,
) -> Result<(f64, f64), ScriptError> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => Ok((*a, *b)),
        _ => Err(ScriptError::Type {
            message: format!(
                "operands of `{}` must be numbers, got {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ),
            pos,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
