//! Trigger collection: which `(owner, member)` pairs a sub-tree depends on.
//!
//! A trigger keeps the owner as an *expression*, not a resolved object —
//! resolution happens when the trigger is subscribed, because the owner
//! may not be evaluable until then. For a nested path `a.b.c`, every link
//! produces a trigger (`a`'s `b` member and `b`'s `c` member): any link
//! changing can invalidate the whole path.

use std::rc::Rc;

use tether_core::{ObjectRef, Value};

use crate::eval::eval;
use crate::tree::Expr;

/// One change dependency of an expression.
#[derive(Clone)]
pub struct Trigger {
    owner_expr: Rc<Expr>,
    member: String,
}

impl Trigger {
    /// The member whose change fires this trigger.
    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// The owner sub-expression.
    #[must_use]
    pub fn owner_expr(&self) -> &Rc<Expr> {
        &self.owner_expr
    }

    /// Evaluate the owner sub-expression to a live object, if possible.
    #[must_use]
    pub fn resolve_owner(&self) -> Option<ObjectRef> {
        match eval(&self.owner_expr) {
            Ok(Value::Object(obj)) => Some(obj),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({:?}.{})", self.owner_expr, self.member)
    }
}

/// Collect every trigger `expr`'s value depends on, in walk order
/// (owners before the accesses built on them).
#[must_use]
pub fn collect_triggers(expr: &Rc<Expr>) -> Vec<Trigger> {
    let mut out = Vec::new();
    walk(expr, &mut out);
    out
}

fn walk(expr: &Rc<Expr>, out: &mut Vec<Trigger>) {
    match &**expr {
        Expr::Constant(_) => {}
        Expr::Member { owner, name } => {
            // A link earlier in the chain invalidates everything after it,
            // so the owner's own triggers come first.
            walk(owner, out);
            out.push(Trigger {
                owner_expr: Rc::clone(owner),
                member: name.clone(),
            });
        }
        Expr::Call { args, .. } => {
            for arg in args {
                walk(arg, out);
            }
        }
        Expr::Equal(l, r) | Expr::And(l, r) => {
            walk(l, out);
            walk(r, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ObjectId, PropertyBag};

    #[test]
    fn constant_has_no_triggers() {
        assert!(collect_triggers(&Expr::constant(5i64)).is_empty());
    }

    #[test]
    fn simple_member_yields_one_trigger() {
        let bag: ObjectRef = Rc::new(PropertyBag::new());
        let expr = Expr::path(Rc::clone(&bag), ["Age"]);

        let triggers = collect_triggers(&expr);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].member(), "Age");
        let owner = triggers[0].resolve_owner().unwrap();
        assert_eq!(ObjectId::of(&owner), ObjectId::of(&bag));
    }

    #[test]
    fn nested_path_yields_a_trigger_per_link() {
        let child = Rc::new(PropertyBag::with_members([("Age", Value::Int(3))]));
        let outer: ObjectRef = Rc::new(PropertyBag::with_members([(
            "Child",
            Value::from(Rc::clone(&child)),
        )]));
        let expr = Expr::path(Rc::clone(&outer), ["Child", "Age"]);

        let triggers = collect_triggers(&expr);
        assert_eq!(triggers.len(), 2);
        // Owners before accesses built on them: outer.Child first.
        assert_eq!(triggers[0].member(), "Child");
        assert_eq!(triggers[1].member(), "Age");

        let first_owner = triggers[0].resolve_owner().unwrap();
        assert_eq!(ObjectId::of(&first_owner), ObjectId::of(&outer));
        let second_owner = triggers[1].resolve_owner().unwrap();
        assert_eq!(
            ObjectId::of(&second_owner),
            ObjectId::of(&(child as ObjectRef))
        );
    }

    #[test]
    fn call_args_contribute_triggers() {
        let foo: ObjectRef = Rc::new(PropertyBag::new());
        let expr = Expr::call(
            "Add",
            |_| Ok(Value::Int(0)),
            vec![
                Expr::path(Rc::clone(&foo), ["A"]),
                Expr::path(Rc::clone(&foo), ["B"]),
            ],
        );

        let members: Vec<_> = collect_triggers(&expr)
            .iter()
            .map(|t| t.member().to_string())
            .collect();
        assert_eq!(members, vec!["A", "B"]);
    }

    #[test]
    fn binary_nodes_recurse_both_operands() {
        let a: ObjectRef = Rc::new(PropertyBag::new());
        let b: ObjectRef = Rc::new(PropertyBag::new());
        let expr = Expr::equal(Expr::path(a, ["X"]), Expr::path(b, ["Y"]));

        let members: Vec<_> = collect_triggers(&expr)
            .iter()
            .map(|t| t.member().to_string())
            .collect();
        assert_eq!(members, vec!["X", "Y"]);
    }

    #[test]
    fn unresolvable_owner_yields_trigger_without_object() {
        let expr = Expr::member(Expr::constant(Value::Null), "Age");
        let triggers = collect_triggers(&expr);
        assert_eq!(triggers.len(), 1);
        assert!(triggers[0].resolve_owner().is_none());
    }
}
