//! The notifying-object capability and the standard adaptor.
//!
//! An object participates in binding by implementing [`Notifying`]: member
//! read/write plus optional change-notification events. The engine never
//! sees concrete types — it holds [`ObjectRef`]s and keys its registry by
//! [`ObjectId`] (allocation identity, never value equality).
//!
//! # Capability discovery
//!
//! The subscription registry probes an object in fixed order:
//!
//! 1. [`Notifying::property_changed`] — the standard event, payload is the
//!    changed member's name; the registry filters per member.
//! 2. [`Notifying::named_event`] with `"<member>Changed"`, then
//!    `"EditingDidEnd"`, `"ValueChanged"`, `"Changed"` — convention events
//!    with no payload; any firing counts as "this member changed".
//!
//! Exposing neither is valid: such an object only participates through
//! manual invalidation.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use crate::event::EventSource;
use crate::value::Value;

/// Shared handle to a live object in the graph.
pub type ObjectRef = Rc<dyn Notifying>;

/// Allocation identity of an object. Two instances with equal state are
/// different ids; cloned `Rc`s to one instance share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Identity of the allocation behind `obj`.
    #[must_use]
    pub fn of(obj: &ObjectRef) -> Self {
        // Discard the vtable half of the fat pointer; the data address
        // alone identifies the allocation.
        Self(Rc::as_ptr(obj).cast::<()>() as usize)
    }
}

/// Capability trait for objects whose members can be bound.
///
/// All methods take `&self`; implementations use interior mutability.
pub trait Notifying {
    /// Read a member. `None` means the member is absent or unreadable.
    fn member(&self, name: &str) -> Option<Value>;

    /// Write a member. Returns `false` when the member is not writable;
    /// the caller treats that as a rejected write, not a fault.
    fn set_member(&self, name: &str, value: Value) -> bool;

    /// The standard "property changed" event, if this object has one.
    /// The payload is the name of the member that changed.
    fn property_changed(&self) -> Option<&EventSource<String>> {
        None
    }

    /// A convention-named change event (`"AgeChanged"`, `"ValueChanged"`,
    /// ...), if this object exposes one under `name`.
    fn named_event(&self, name: &str) -> Option<&EventSource<()>> {
        let _ = name;
        None
    }
}

// ---------------------------------------------------------------------------
// PropertyBag
// ---------------------------------------------------------------------------

/// The standard [`Notifying`] adaptor: a string-keyed member map with a
/// property-changed event.
///
/// Writes through [`set`](PropertyBag::set) or `set_member` do **not**
/// raise the event on their own; callers raise it explicitly via
/// [`raise_changed`](PropertyBag::raise_changed) (or use the engine's
/// manual invalidation). This mirrors hosts where mutation and
/// notification are separate steps.
pub struct PropertyBag {
    members: RefCell<AHashMap<String, Value>>,
    read_only: RefCell<AHashSet<String>>,
    changed: EventSource<String>,
}

impl Default for PropertyBag {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: RefCell::new(AHashMap::new()),
            read_only: RefCell::new(AHashSet::new()),
            changed: EventSource::new(),
        }
    }

    /// Create a bag pre-populated from `(name, value)` pairs.
    #[must_use]
    pub fn with_members<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let bag = Self::new();
        for (name, value) in members {
            bag.members.borrow_mut().insert(name.into(), value);
        }
        bag
    }

    /// Write a member directly, bypassing writability checks. Does not
    /// raise the change event.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.members.borrow_mut().insert(name.into(), value.into());
    }

    /// Read a member.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.members.borrow().get(name).cloned()
    }

    /// Mark a member as read-only: `set_member` on it returns `false`
    /// from now on. Direct [`set`](PropertyBag::set) still works.
    pub fn mark_read_only(&self, name: impl Into<String>) {
        self.read_only.borrow_mut().insert(name.into());
    }

    /// Raise the property-changed event for `name`.
    pub fn raise_changed(&self, name: &str) {
        self.changed.raise(&name.to_string());
    }
}

impl Notifying for PropertyBag {
    fn member(&self, name: &str) -> Option<Value> {
        self.members.borrow().get(name).cloned()
    }

    fn set_member(&self, name: &str, value: Value) -> bool {
        if self.read_only.borrow().contains(name) {
            return false;
        }
        self.members.borrow_mut().insert(name.to_string(), value);
        true
    }

    fn property_changed(&self) -> Option<&EventSource<String>> {
        Some(&self.changed)
    }
}

impl std::fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyBag")
            .field("members", &self.members.borrow().len())
            .field("subscribers", &self.changed.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
