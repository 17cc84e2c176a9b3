//! The process-wide subscription registry.
//!
//! Keyed by `(object identity, member)`, the registry owns exactly one
//! host-side change subscription per key, created lazily when the first
//! callback registers and torn down when the last one leaves. Many
//! independent bindings may register on the same key; removing one
//! binding's callbacks never disturbs another's.
//!
//! # Capability detection
//!
//! When an entry is created the owner is probed in fixed order: the
//! standard property-changed event first (filtered to the member), then
//! the convention events `"<member>Changed"`, `"EditingDidEnd"`,
//! `"ValueChanged"`, `"Changed"`. First match wins. No capability at all
//! is *silent* — the entry exists but never fires on its own; callers use
//! manual invalidation instead.
//!
//! # Invariants
//!
//! 1. At most one entry per key; all callbacks for the key share it.
//! 2. Callbacks fire in registration order.
//! 3. Host notifications carry change id [`HOST_CHANGE_ID`] (0); binding
//!    issued ids start at 1, so a host notification is never mistaken for
//!    a binding's own in-flight write.
//!
//! The registry lives in a `thread_local`: all mutation happens on one
//! logical thread (the host's event-dispatch thread), so no locking.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use tether_core::{EventToken, Notifying, ObjectId, ObjectRef};

/// Change id carried by host-originated and manual notifications.
pub const HOST_CHANGE_ID: u64 = 0;

/// Convention event names probed after `"<member>Changed"`.
const CONVENTION_EVENTS: [&str; 3] = ["EditingDidEnd", "ValueChanged", "Changed"];

type Key = (ObjectId, String);
type ChangeCallback = Rc<dyn Fn(u64)>;

/// Identifies one registered callback; returned by
/// [`SubscriptionRegistry::add_callback`], consumed by
/// [`SubscriptionRegistry::remove_callback`].
#[derive(Clone)]
pub struct CallbackHandle {
    key: Key,
    id: u64,
}

impl std::fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("member", &self.key.1)
            .field("id", &self.id)
            .finish()
    }
}

/// How an entry is wired to its owner's change notification.
enum HostWiring {
    /// Subscribed to the standard property-changed event.
    PropertyChanged(EventToken),
    /// Subscribed to a convention-named event.
    Named(String, EventToken),
    /// No capability found; fires only via manual invalidation.
    None,
}

struct ListenerEntry {
    owner: Weak<dyn Notifying>,
    wiring: HostWiring,
    callbacks: Vec<(u64, ChangeCallback)>,
}

/// Process-scoped subscription state. Accessed only through the
/// associated functions, which operate on a thread-local instance.
pub struct SubscriptionRegistry {
    entries: AHashMap<Key, ListenerEntry>,
    next_callback_id: u64,
}

thread_local! {
    static REGISTRY: RefCell<SubscriptionRegistry> = RefCell::new(SubscriptionRegistry {
        entries: AHashMap::new(),
        next_callback_id: 0,
    });
}

impl SubscriptionRegistry {
    /// Register `callback` for changes of `member` on `owner`.
    ///
    /// Creates the listener entry (and the host subscription) lazily on
    /// first registration for the key.
    ///
    /// # Panics
    ///
    /// Panics on an empty member identifier — that is a programming
    /// error, not a runtime data condition.
    pub fn add_callback(
        owner: &ObjectRef,
        member: &str,
        callback: ChangeCallback,
    ) -> CallbackHandle {
        assert!(!member.is_empty(), "member identifier must not be empty");

        let key: Key = (ObjectId::of(owner), member.to_string());
        let exists = REGISTRY.with(|r| r.borrow().entries.contains_key(&key));
        if !exists {
            // Probe the host capability outside the registry borrow; the
            // wired closure re-enters the registry when the event fires.
            let wiring = wire_host(owner, member, key.0);
            tracing::debug!(
                target: "tether",
                member,
                wired = !matches!(wiring, HostWiring::None),
                "listener entry created"
            );
            let entry = ListenerEntry {
                owner: Rc::downgrade(owner),
                wiring,
                callbacks: Vec::new(),
            };
            REGISTRY.with(|r| r.borrow_mut().entries.insert(key.clone(), entry));
        }

        let id = REGISTRY.with(|r| {
            let mut r = r.borrow_mut();
            let id = r.next_callback_id;
            r.next_callback_id += 1;
            r.entries
                .get_mut(&key)
                .expect("entry exists: created above")
                .callbacks
                .push((id, callback));
            id
        });
        CallbackHandle { key, id }
    }

    /// Remove the callback behind `handle`. When that empties its entry,
    /// the host subscription is torn down and the entry discarded.
    /// Unknown or already removed handles are ignored.
    pub fn remove_callback(handle: &CallbackHandle) {
        let removed_entry = REGISTRY.with(|r| {
            let mut r = r.borrow_mut();
            let Some(entry) = r.entries.get_mut(&handle.key) else {
                return None;
            };
            entry.callbacks.retain(|(id, _)| *id != handle.id);
            if entry.callbacks.is_empty() {
                r.entries.remove(&handle.key)
            } else {
                None
            }
        });
        if let Some(entry) = removed_entry {
            tracing::debug!(target: "tether", member = %handle.key.1, "listener entry torn down");
            unwire(&entry);
        }
    }

    /// Synchronously invoke every callback registered for
    /// `(owner, member)`, in registration order, passing `change_id`.
    pub fn invalidate(owner: &ObjectRef, member: &str, change_id: u64) {
        Self::invalidate_id(ObjectId::of(owner), member, change_id);
    }

    fn invalidate_id(owner: ObjectId, member: &str, change_id: u64) {
        // Snapshot before invoking: callbacks may register, remove, or
        // re-invalidate while running.
        let snapshot: Option<Vec<ChangeCallback>> = REGISTRY.with(|r| {
            r.borrow()
                .entries
                .get(&(owner, member.to_string()))
                .map(|e| e.callbacks.iter().map(|(_, f)| Rc::clone(f)).collect())
        });
        let Some(callbacks) = snapshot else {
            return;
        };
        tracing::trace!(
            target: "tether",
            member,
            change_id,
            count = callbacks.len(),
            "invalidate"
        );
        for f in callbacks {
            f(change_id);
        }
    }

    /// Drop every entry and host subscription. Test/shutdown support.
    pub fn reset() {
        let entries: Vec<ListenerEntry> = REGISTRY.with(|r| {
            let mut r = r.borrow_mut();
            r.entries.drain().map(|(_, e)| e).collect()
        });
        for entry in &entries {
            unwire(entry);
        }
    }

    /// Number of live listener entries.
    #[must_use]
    pub fn entry_count() -> usize {
        REGISTRY.with(|r| r.borrow().entries.len())
    }

    /// Number of callbacks registered for one key.
    #[must_use]
    pub fn callback_count(owner: &ObjectRef, member: &str) -> usize {
        let key = (ObjectId::of(owner), member.to_string());
        REGISTRY.with(|r| {
            r.borrow()
                .entries
                .get(&key)
                .map_or(0, |e| e.callbacks.len())
        })
    }
}

/// Probe `owner` for a change-notification capability and subscribe the
/// first one found.
fn wire_host(owner: &ObjectRef, member: &str, owner_id: ObjectId) -> HostWiring {
    if let Some(event) = owner.property_changed() {
        let member_owned = member.to_string();
        let token = event.subscribe(move |changed: &String| {
            if *changed == member_owned {
                SubscriptionRegistry::invalidate_id(owner_id, &member_owned, HOST_CHANGE_ID);
            }
        });
        return HostWiring::PropertyChanged(token);
    }

    let mut candidates = vec![format!("{member}Changed")];
    candidates.extend(CONVENTION_EVENTS.iter().map(|s| (*s).to_string()));
    for name in candidates {
        if let Some(event) = owner.named_event(&name) {
            let member_owned = member.to_string();
            // Convention events carry no member name; any firing counts
            // as "this member changed".
            let token = event.subscribe(move |()| {
                SubscriptionRegistry::invalidate_id(owner_id, &member_owned, HOST_CHANGE_ID);
            });
            return HostWiring::Named(name, token);
        }
    }

    // NoCapabilityFound is deliberately silent: the entry simply never
    // fires automatically.
    HostWiring::None
}

fn unwire(entry: &ListenerEntry) {
    let Some(owner) = entry.owner.upgrade() else {
        return;
    };
    match &entry.wiring {
        HostWiring::PropertyChanged(token) => {
            if let Some(event) = owner.property_changed() {
                event.unsubscribe(*token);
            }
        }
        HostWiring::Named(name, token) => {
            if let Some(event) = owner.named_event(name) {
                event.unsubscribe(*token);
            }
        }
        HostWiring::None => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
