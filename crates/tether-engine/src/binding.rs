//! Equality bindings and the propagation algorithm.
//!
//! An equality binding is the atomic unit of synchronization between two
//! expression sub-trees. Construction resolves an initial consistent
//! value (right wins unless the left side is not writable), then wires a
//! callback per trigger on each side: left-side triggers re-evaluate the
//! left expression and push to the right, and symmetrically.
//!
//! # Propagation
//!
//! On a notification carrying change id `c`:
//!
//! 1. Bail if `c` is one of this binding's in-flight ids — the
//!    notification is the echo of its own write.
//! 2. Re-evaluate the changed side.
//! 3. Bail if the value loosely equals the cached value (no-op change).
//! 4. Cache the value, allocate a fresh id, mark it in flight, write the
//!    dependent side, and unmark on every exit path.
//!
//! The in-flight set is per binding, not global: independent bindings
//! sharing an object stay fully reactive to each other — each only
//! suppresses notifications tagged with an id it issued itself.
//!
//! # Invariants
//!
//! 1. `cached` always holds the last value written or observed on the
//!    dominant side, and is compared before every write.
//! 2. One external mutation causes at most one write per binding.
//! 3. Unbinding removes exactly the callbacks this binding registered.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tether_core::Value;
use tether_expr::{Expr, collect_triggers, eval, resolve};

use crate::registry::{CallbackHandle, SubscriptionRegistry};
use crate::report::{BindError, report_error};

/// Attempt to write `value` into the location denoted by `expr`.
///
/// Succeeds only for a member access that resolves to a live, writable
/// owner. On success the write is followed by an invalidation of the
/// written member, so dependents learn of the change. Failures report
/// [`BindError::WriteRejected`] and return `false` — never a panic.
pub fn set_value(expr: &Expr, value: Value, change_id: u64) -> bool {
    let Some(accessor) = resolve(expr) else {
        report_error(&BindError::WriteRejected {
            detail: format!("target is a {} node, not a member access", expr.kind()),
        });
        return false;
    };
    let Some(owner) = accessor.owner().cloned() else {
        report_error(&BindError::WriteRejected {
            detail: format!(
                "owner of member '{}' is null or not an object",
                accessor.member()
            ),
        });
        return false;
    };
    if !owner.set_member(accessor.member(), value) {
        report_error(&BindError::WriteRejected {
            detail: format!("member '{}' is not writable", accessor.member()),
        });
        return false;
    }
    SubscriptionRegistry::invalidate(&owner, accessor.member(), change_id);
    true
}

// ---------------------------------------------------------------------------
// EqualityBinding
// ---------------------------------------------------------------------------

struct EqualityState {
    /// Last value known to be consistent across both sides.
    cached: Value,
    left_handles: Vec<CallbackHandle>,
    right_handles: Vec<CallbackHandle>,
    /// Monotonic, local to this binding. Starts at 1 so it can never
    /// collide with [`HOST_CHANGE_ID`](crate::registry::HOST_CHANGE_ID).
    next_change_id: u64,
    /// Ids of writes currently in flight; notifications carrying one of
    /// these are this binding's own echo.
    active: Vec<u64>,
    unbound: bool,
}

impl EqualityState {
    fn take_change_id(&mut self) -> u64 {
        let id = self.next_change_id;
        self.next_change_id += 1;
        id
    }
}

pub(crate) struct EqualityBinding {
    state: Rc<RefCell<EqualityState>>,
}

impl EqualityBinding {
    /// Build a binding between `left` and `right`, performing the
    /// initial assignment and subscribing both sides' triggers.
    ///
    /// Initial direction is right→left; if the left side rejects the
    /// write, left→right is attempted instead. Both failing is a
    /// reported condition, not a constructor failure — the binding still
    /// subscribes whatever triggers it can.
    pub(crate) fn new(left: Rc<Expr>, right: Rc<Expr>) -> Self {
        let state = Rc::new(RefCell::new(EqualityState {
            cached: Value::Null,
            left_handles: Vec::new(),
            right_handles: Vec::new(),
            next_change_id: 1,
            active: Vec::new(),
            unbound: false,
        }));

        let init_id = state.borrow_mut().take_change_id();
        let mut initialized = false;
        if let Ok(v) = eval(&right) {
            state.borrow_mut().cached = v.clone();
            initialized = set_value(&left, v, init_id);
        }
        if !initialized
            && let Ok(v) = eval(&left)
        {
            state.borrow_mut().cached = v.clone();
            let _ = set_value(&right, v, init_id);
        }

        let left_handles = subscribe_side(&state, &left, &right);
        let right_handles = subscribe_side(&state, &right, &left);
        {
            let mut s = state.borrow_mut();
            s.left_handles = left_handles;
            s.right_handles = right_handles;
        }

        tracing::debug!(
            target: "tether",
            left = ?left,
            right = ?right,
            "equality binding created"
        );
        Self { state }
    }

    /// Remove every callback this binding registered. Idempotent.
    pub(crate) fn unbind(&self) {
        let handles: Vec<CallbackHandle> = {
            let mut s = self.state.borrow_mut();
            if s.unbound {
                return;
            }
            s.unbound = true;
            let mut hs: Vec<CallbackHandle> = s.left_handles.drain(..).collect();
            hs.extend(s.right_handles.drain(..));
            hs
        };
        for h in &handles {
            SubscriptionRegistry::remove_callback(h);
        }
    }
}

/// Register one callback per trigger of `source`; each re-evaluates
/// `source` on notification and propagates toward `dependent`.
fn subscribe_side(
    state: &Rc<RefCell<EqualityState>>,
    source: &Rc<Expr>,
    dependent: &Rc<Expr>,
) -> Vec<CallbackHandle> {
    let mut handles = Vec::new();
    for trigger in collect_triggers(source) {
        // An owner that cannot be resolved now has nothing to subscribe
        // on; the trigger stays dormant.
        let Some(owner) = trigger.resolve_owner() else {
            continue;
        };
        let weak = Rc::downgrade(state);
        let source = Rc::clone(source);
        let dependent = Rc::clone(dependent);
        let handle = SubscriptionRegistry::add_callback(
            &owner,
            trigger.member(),
            Rc::new(move |change_id| propagate(&weak, &source, &dependent, change_id)),
        );
        handles.push(handle);
    }
    handles
}

/// One propagation pass: source side changed, push toward the dependent.
fn propagate(
    state: &Weak<RefCell<EqualityState>>,
    source: &Rc<Expr>,
    dependent: &Rc<Expr>,
    change_id: u64,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    {
        let s = state.borrow();
        if s.unbound {
            return;
        }
        if s.active.contains(&change_id) {
            // Echo of this binding's own in-flight write.
            tracing::trace!(target: "tether", change_id, "suppressed reentrant notification");
            return;
        }
    }

    let value = match eval(source) {
        Ok(v) => v,
        Err(err) => {
            tracing::trace!(target: "tether", %err, "source side failed to evaluate");
            return;
        }
    };

    let own_id = {
        let mut s = state.borrow_mut();
        if value.loosely_eq(&s.cached) {
            // No actual change: suppress the write and everything
            // downstream of it.
            return;
        }
        s.cached = value.clone();
        let id = s.take_change_id();
        s.active.push(id);
        id
    };

    // The guard clears the in-flight id even if the write path panics.
    let _guard = ActiveGuard {
        state: Rc::clone(&state),
        id: own_id,
    };
    let _ = set_value(dependent, value, own_id);
}

struct ActiveGuard {
    state: Rc<RefCell<EqualityState>>,
    id: u64,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if let Ok(mut s) = self.state.try_borrow_mut() {
            let id = self.id;
            s.active.retain(|i| *i != id);
        }
    }
}

// ---------------------------------------------------------------------------
// Binding — the public handle
// ---------------------------------------------------------------------------

/// A live synchronization relationship. Obtained from
/// [`create`](crate::facade::create); ends with [`unbind`](Binding::unbind).
pub struct Binding {
    kind: BindingKind,
}

enum BindingKind {
    /// Produced for unsupported formulas; synchronizes nothing.
    Noop,
    Equality(EqualityBinding),
    Composite(Vec<Binding>),
}

impl Binding {
    pub(crate) fn noop() -> Self {
        Self {
            kind: BindingKind::Noop,
        }
    }

    pub(crate) fn equality(binding: EqualityBinding) -> Self {
        Self {
            kind: BindingKind::Equality(binding),
        }
    }

    pub(crate) fn composite(children: Vec<Binding>) -> Self {
        Self {
            kind: BindingKind::Composite(children),
        }
    }

    /// Stop synchronizing. Removes every callback this binding (and, for
    /// composites, every child) registered; a second call is a no-op. An
    /// unbound binding cannot be revived — build a new one.
    pub fn unbind(&self) {
        match &self.kind {
            BindingKind::Noop => {}
            BindingKind::Equality(b) => b.unbind(),
            BindingKind::Composite(children) => {
                for child in children {
                    child.unbind();
                }
            }
        }
    }

    /// Whether this binding synchronizes nothing at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match &self.kind {
            BindingKind::Noop => true,
            BindingKind::Equality(_) => false,
            BindingKind::Composite(children) => children.is_empty(),
        }
    }

    /// Number of equality bindings underneath this handle.
    #[must_use]
    pub fn equality_count(&self) -> usize {
        match &self.kind {
            BindingKind::Noop => 0,
            BindingKind::Equality(_) => 1,
            BindingKind::Composite(children) => {
                children.iter().map(Binding::equality_count).sum()
            }
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            BindingKind::Noop => "noop",
            BindingKind::Equality(_) => "equality",
            BindingKind::Composite(_) => "composite",
        };
        f.debug_struct("Binding")
            .field("kind", &kind)
            .field("equalities", &self.equality_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tether_core::{ObjectRef, PropertyBag};

    use crate::report::add_listener;

    fn bag(pairs: &[(&str, Value)]) -> Rc<PropertyBag> {
        Rc::new(PropertyBag::with_members(
            pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())),
        ))
    }

    #[test]
    fn set_value_writes_and_invalidates() {
        SubscriptionRegistry::reset();
        let b = bag(&[("X", Value::Int(0))]);
        let obj: ObjectRef = Rc::clone(&b) as _;
        let expr = Expr::path(Rc::clone(&obj), ["X"]);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _h = SubscriptionRegistry::add_callback(&obj, "X", Rc::new(move |id| {
            s.borrow_mut().push(id);
        }));

        assert!(set_value(&expr, Value::Int(9), 5));
        assert_eq!(b.get("X"), Some(Value::Int(9)));
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn set_value_rejects_non_member_target() {
        SubscriptionRegistry::reset();
        let reports = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&reports);
        let _guard = add_listener(move |msg| r.borrow_mut().push(msg.to_string()));

        assert!(!set_value(&Expr::constant(1i64), Value::Int(2), 1));
        assert!(reports.borrow()[0].contains("not a member access"));
    }

    #[test]
    fn set_value_rejects_null_owner() {
        SubscriptionRegistry::reset();
        let expr = Expr::member(Expr::constant(Value::Null), "X");
        assert!(!set_value(&expr, Value::Int(2), 1));
    }

    #[test]
    fn set_value_rejects_read_only_member() {
        SubscriptionRegistry::reset();
        let b = bag(&[("X", Value::Int(0))]);
        b.mark_read_only("X");
        let expr = Expr::path(Rc::clone(&b) as _, ["X"]);
        assert!(!set_value(&expr, Value::Int(2), 1));
        assert_eq!(b.get("X"), Some(Value::Int(0)));
    }

    #[test]
    fn initial_write_prefers_right_to_left() {
        SubscriptionRegistry::reset();
        let left = bag(&[("V", Value::from(""))]);
        let right = bag(&[("V", Value::from("hello"))]);

        let binding = EqualityBinding::new(
            Expr::path(Rc::clone(&left) as _, ["V"]),
            Expr::path(Rc::clone(&right) as _, ["V"]),
        );

        assert_eq!(left.get("V"), Some(Value::from("hello")));
        assert_eq!(right.get("V"), Some(Value::from("hello")));
        binding.unbind();
    }

    #[test]
    fn initial_write_falls_back_left_to_right() {
        SubscriptionRegistry::reset();
        let left = bag(&[("V", Value::Int(1))]);
        left.mark_read_only("V");
        let right = bag(&[("V", Value::Int(2))]);

        let binding = EqualityBinding::new(
            Expr::path(Rc::clone(&left) as _, ["V"]),
            Expr::path(Rc::clone(&right) as _, ["V"]),
        );

        assert_eq!(left.get("V"), Some(Value::Int(1)));
        assert_eq!(right.get("V"), Some(Value::Int(1)), "direction flipped");
        binding.unbind();
    }

    #[test]
    fn unbind_twice_is_safe() {
        SubscriptionRegistry::reset();
        let left = bag(&[("V", Value::Int(0))]);
        let right = bag(&[("V", Value::Int(1))]);
        let binding = EqualityBinding::new(
            Expr::path(Rc::clone(&left) as _, ["V"]),
            Expr::path(Rc::clone(&right) as _, ["V"]),
        );

        binding.unbind();
        binding.unbind();
        assert_eq!(SubscriptionRegistry::entry_count(), 0);
    }

    #[test]
    fn unbind_leaves_other_bindings_on_shared_key_alive() {
        SubscriptionRegistry::reset();
        let shared = bag(&[("V", Value::Int(0))]);
        let a = bag(&[("V", Value::Int(1))]);
        let b = bag(&[("V", Value::Int(2))]);

        let ba = EqualityBinding::new(
            Expr::path(Rc::clone(&a) as _, ["V"]),
            Expr::path(Rc::clone(&shared) as _, ["V"]),
        );
        let bb = EqualityBinding::new(
            Expr::path(Rc::clone(&b) as _, ["V"]),
            Expr::path(Rc::clone(&shared) as _, ["V"]),
        );

        ba.unbind();

        // The b↔shared binding must still propagate.
        shared.set("V", 42i64);
        shared.raise_changed("V");
        assert_eq!(b.get("V"), Some(Value::Int(42)));
        assert_ne!(a.get("V"), Some(Value::Int(42)));

        bb.unbind();
    }

    #[test]
    fn noop_binding_reports_zero_equalities() {
        let b = Binding::noop();
        assert!(b.is_noop());
        assert_eq!(b.equality_count(), 0);
        b.unbind();
        b.unbind();
    }

    #[test]
    fn empty_composite_counts_as_noop() {
        let b = Binding::composite(Vec::new());
        assert!(b.is_noop());
    }
}
