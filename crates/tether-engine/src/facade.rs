//! Formula decomposition and the public entry points.
//!
//! [`create`] accepts the top of a parsed formula tree: an equality
//! produces one binding, a conjunction is flattened into its conjuncts
//! (source order preserved) and grouped into a composite, and anything
//! else is reported as unsupported and yields a no-op binding — the
//! caller's application keeps running either way.

use std::rc::Rc;

use tether_core::ObjectRef;
use tether_expr::Expr;

use crate::binding::{Binding, EqualityBinding};
use crate::registry::{HOST_CHANGE_ID, SubscriptionRegistry};
use crate::report::{BindError, report_error};

/// Build the binding(s) declared by `formula`.
///
/// Conjuncts of one conjunction are initialized left-to-right in source
/// order, each fully (including its initial write) before the next
/// begins. Conjuncts that yield no binding are dropped from the
/// composite.
#[must_use]
pub fn create(formula: &Rc<Expr>) -> Binding {
    match &**formula {
        Expr::Equal(left, right) => {
            Binding::equality(EqualityBinding::new(Rc::clone(left), Rc::clone(right)))
        }
        Expr::And(..) => {
            let children: Vec<Binding> = conjuncts(formula)
                .iter()
                .map(create)
                .filter(|b| !b.is_noop())
                .collect();
            Binding::composite(children)
        }
        other => {
            report_error(&BindError::UnsupportedFormula { kind: other.kind() });
            Binding::noop()
        }
    }
}

/// Split a conjunction into its conjuncts in authored order.
///
/// The parser leaves `a && b && c` left-leaning (`(a && b) && c`), so the
/// walk descends the left spine collecting right operands, then reverses.
fn conjuncts(formula: &Rc<Expr>) -> Vec<Rc<Expr>> {
    let mut parts = Vec::new();
    let mut node = Rc::clone(formula);
    loop {
        let next = match &*node {
            Expr::And(left, right) => {
                parts.push(Rc::clone(right));
                Rc::clone(left)
            }
            _ => {
                parts.push(Rc::clone(&node));
                break;
            }
        };
        node = next;
    }
    parts.reverse();
    parts
}

/// Manually signal that `member` of `owner` changed.
///
/// The escape hatch for objects without a discoverable notification
/// capability: invokes every callback registered for the key, exactly as
/// an automatic notification would.
pub fn notify_member_changed(owner: &ObjectRef, member: &str) {
    SubscriptionRegistry::invalidate(owner, member, HOST_CHANGE_ID);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
