//! Resolving member-access nodes to live read/write views.
//!
//! An [`Accessor`] is a point-in-time snapshot: the owner sub-expression
//! may itself be dynamic (a nested path whose intermediate object was
//! swapped out), so callers re-resolve before every read or write rather
//! than caching one.

use tether_core::{ObjectRef, Value};

use crate::eval::eval;
use crate::tree::Expr;

/// A resolved view of one member-access expression.
///
/// `owner` is `None` when the owner sub-expression failed to evaluate or
/// did not produce an object; such an accessor reads `None` and rejects
/// writes.
pub struct Accessor {
    owner: Option<ObjectRef>,
    member: String,
}

impl Accessor {
    /// The resolved owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&ObjectRef> {
        self.owner.as_ref()
    }

    /// The member this accessor targets.
    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Read the member's current value.
    #[must_use]
    pub fn read(&self) -> Option<Value> {
        self.owner.as_ref().and_then(|o| o.member(&self.member))
    }

    /// Write `value` into the member. `false` when the owner is gone or
    /// the member is not writable.
    #[must_use]
    pub fn write(&self, value: Value) -> bool {
        match &self.owner {
            Some(o) => o.set_member(&self.member, value),
            None => false,
        }
    }
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor")
            .field("member", &self.member)
            .field("resolved", &self.owner.is_some())
            .finish()
    }
}

/// Resolve `expr` to an [`Accessor`].
///
/// Only member-access nodes resolve; every other node kind returns
/// `None` — those are the read-only "complex" endpoints.
#[must_use]
pub fn resolve(expr: &Expr) -> Option<Accessor> {
    let Expr::Member { owner, name } = expr else {
        return None;
    };
    let owner = match eval(owner) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    };
    Some(Accessor {
        owner,
        member: name.clone(),
    })
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
    fn non_member_does_not_resolve() {
        assert!(resolve(&Expr::constant(1i64)).is_none());
        let eq = Expr::equal(Expr::constant(1i64), Expr::constant(1i64));
        assert!(resolve(&eq).is_none());
    }

    #[test]
    fn member_resolves_and_round_trips() {
        let bag = Rc::new(PropertyBag::with_members([("Age", Value::Int(5))]));
        let expr = Expr::path(bag, ["Age"]);

        let acc = resolve(&expr).unwrap();
        assert_eq!(acc.read(), Some(Value::Int(5)));
        assert!(acc.write(Value::Int(6)));
        assert_eq!(acc.read(), Some(Value::Int(6)));
    }

    #[test]
    fn null_owner_resolves_unwritable() {
        let expr = Expr::member(Expr::constant(Value::Null), "Age");
        let acc = resolve(&expr).unwrap();
        assert!(acc.owner().is_none());
        assert!(acc.read().is_none());
        assert!(!acc.write(Value::Int(1)));
    }

    #[test]
    fn re_resolution_follows_a_swapped_owner() {
        // outer.Child.Age where Child is replaced between resolutions.
        let child1 = Rc::new(PropertyBag::with_members([("Age", Value::Int(1))]));
        let child2 = Rc::new(PropertyBag::with_members([("Age", Value::Int(2))]));
        let outer = Rc::new(PropertyBag::with_members([(
            "Child",
            Value::from(Rc::clone(&child1)),
        )]));
        let expr = Expr::path(Rc::clone(&outer) as _, ["Child", "Age"]);

        assert_eq!(resolve(&expr).unwrap().read(), Some(Value::Int(1)));

        outer.set("Child", Value::from(child2));
        assert_eq!(resolve(&expr).unwrap().read(), Some(Value::Int(2)));
    }

    #[test]
    fn write_respects_read_only_members() {
        let bag = Rc::new(PropertyBag::with_members([("Total", Value::Int(0))]));
        bag.mark_read_only("Total");
        let expr = Expr::path(bag, ["Total"]);
        let acc = resolve(&expr).unwrap();
        assert!(!acc.write(Value::Int(9)));
    }
}
