//! Pure recursive evaluation of expression trees.
//!
//! Constants and member walks are handled directly; call nodes delegate
//! to their [`CallFn`](crate::tree::CallFn). Evaluation never mutates the
//! tree or the object graph.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Variant |
//! |---------|-------|---------|
//! | Owner is null | member access on `Null` | `NullOwner` |
//! | Owner not an object | member access on e.g. an int | `NotAnObject` |
//! | Member missing/unreadable | object has no such member | `Unreadable` |
//! | Call fails | `CallFn` returned an error | `Call` |
//! | Non-bool `&&` operand | conjunction over non-booleans | `NotABool` |

use tether_core::Value;

use crate::tree::Expr;

/// Errors from expression evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A member access whose owner evaluated to `Null`.
    NullOwner { member: String },
    /// A member access whose owner is not an object.
    NotAnObject { member: String, found: &'static str },
    /// The owner has no readable member of this name.
    Unreadable { member: String },
    /// A call node's function reported a failure.
    Call { name: String, message: String },
    /// A `&&` operand that did not evaluate to a boolean.
    NotABool { found: &'static str },
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullOwner { member } => {
                write!(f, "cannot access member '{member}' on null")
            }
            Self::NotAnObject { member, found } => {
                write!(f, "cannot access member '{member}' on a {found}")
            }
            Self::Unreadable { member } => {
                write!(f, "member '{member}' is missing or unreadable")
            }
            Self::Call { name, message } => write!(f, "call '{name}' failed: {message}"),
            Self::NotABool { found } => {
                write!(f, "'&&' operand is a {found}, expected bool")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluate `expr` to a concrete value.
pub fn eval(expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Constant(v) => Ok(v.clone()),
        Expr::Member { owner, name } => match eval(owner)? {
            Value::Object(obj) => obj.member(name).ok_or_else(|| EvalError::Unreadable {
                member: name.clone(),
            }),
            Value::Null => Err(EvalError::NullOwner {
                member: name.clone(),
            }),
            other => Err(EvalError::NotAnObject {
                member: name.clone(),
                found: other.type_name(),
            }),
        },
        Expr::Call { func, args, .. } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg)?);
            }
            func(&values)
        }
        Expr::Equal(left, right) => {
            let l = eval(left)?;
            let r = eval(right)?;
            Ok(Value::Bool(l.loosely_eq(&r)))
        }
        Expr::And(left, right) => {
            let l = as_bool(eval(left)?)?;
            // Short-circuit like the host operator would.
            if !l {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(as_bool(eval(right)?)?))
        }
    }
}

fn as_bool(v: Value) -> Result<bool, EvalError> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::NotABool {
            found: other.type_name(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
