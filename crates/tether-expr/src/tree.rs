//! The expression tree the engine binds against.
//!
//! Five node kinds, a closed union: constants, member accesses, calls,
//! equality, and conjunction. Sub-trees are shared via `Rc` because one
//! node (a member access's owner, say) ends up referenced both by the
//! tree and by the triggers collected from it.

use std::rc::Rc;

use tether_core::{ObjectRef, Value};

use crate::eval::EvalError;

/// The pluggable evaluator for computed sub-expressions: arithmetic,
/// method calls, string concatenation — anything beyond constants and
/// member walks. Receives already-evaluated arguments.
pub type CallFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// An immutable expression-tree node.
#[derive(Clone)]
pub enum Expr {
    /// A literal value, including object leaves.
    Constant(Value),
    /// `owner.name` — the owner sub-expression must evaluate to an object.
    Member { owner: Rc<Expr>, name: String },
    /// A computed sub-expression; `name` only labels diagnostics.
    Call {
        name: String,
        func: CallFn,
        args: Vec<Rc<Expr>>,
    },
    /// `left == right`, evaluating to a boolean.
    Equal(Rc<Expr>, Rc<Expr>),
    /// `left && right`, evaluating to a boolean.
    And(Rc<Expr>, Rc<Expr>),
}

impl Expr {
    /// A constant node.
    pub fn constant(value: impl Into<Value>) -> Rc<Self> {
        Rc::new(Expr::Constant(value.into()))
    }

    /// An object leaf — a constant holding a live object.
    pub fn object(obj: ObjectRef) -> Rc<Self> {
        Rc::new(Expr::Constant(Value::Object(obj)))
    }

    /// A member access on `owner`.
    pub fn member(owner: Rc<Expr>, name: impl Into<String>) -> Rc<Self> {
        Rc::new(Expr::Member {
            owner,
            name: name.into(),
        })
    }

    /// A nested member chain rooted at `obj`: `path(o, ["a", "b"])`
    /// builds `o.a.b`.
    pub fn path<'a>(obj: ObjectRef, members: impl IntoIterator<Item = &'a str>) -> Rc<Self> {
        let mut node = Self::object(obj);
        for name in members {
            node = Self::member(node, name);
        }
        node
    }

    /// A call node delegating to `func`.
    pub fn call(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
        args: Vec<Rc<Expr>>,
    ) -> Rc<Self> {
        Rc::new(Expr::Call {
            name: name.into(),
            func: Rc::new(func),
            args,
        })
    }

    /// `left == right`.
    pub fn equal(left: Rc<Expr>, right: Rc<Expr>) -> Rc<Self> {
        Rc::new(Expr::Equal(left, right))
    }

    /// `left && right`.
    pub fn and(left: Rc<Expr>, right: Rc<Expr>) -> Rc<Self> {
        Rc::new(Expr::And(left, right))
    }

    /// Short node-kind label for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Constant(_) => "constant",
            Expr::Member { .. } => "member-access",
            Expr::Call { .. } => "call",
            Expr::Equal(..) => "equal",
            Expr::And(..) => "and",
        }
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v:?}"),
            Expr::Member { owner, name } => write!(f, "{owner:?}.{name}"),
            Expr::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a:?}")?;
                }
                write!(f, ")")
            }
            Expr::Equal(l, r) => write!(f, "({l:?} == {r:?})"),
            Expr::And(l, r) => write!(f, "({l:?} && {r:?})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use tether_core::PropertyBag;

    #[test]
    fn path_builds_nested_member_chain() {
        let obj: ObjectRef = Rc::new(PropertyBag::new());
        let expr = Expr::path(obj, ["a", "b", "c"]);

        let Expr::Member { owner, name } = &*expr else {
            panic!("expected member access");
        };
        assert_eq!(name, "c");
        let Expr::Member { name, .. } = &**owner else {
            panic!("expected nested member access");
        };
        assert_eq!(name, "b");
    }

    #[test]
    fn debug_rendering() {
        let obj: ObjectRef = Rc::new(PropertyBag::new());
        let age = Expr::path(Rc::clone(&obj), ["Age"]);
        let formula = Expr::equal(Rc::clone(&age), Expr::constant(42i64));
        let rendered = format!("{formula:?}");
        assert!(rendered.contains(".Age"));
        assert!(rendered.contains("=="));
    }

    #[test]
    fn kind_labels() {
        assert_eq!(Expr::constant(1i64).kind(), "constant");
        let obj: ObjectRef = Rc::new(PropertyBag::new());
        assert_eq!(Expr::path(obj, ["x"]).kind(), "member-access");
    }
}
