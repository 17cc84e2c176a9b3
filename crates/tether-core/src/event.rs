//! Callback lists with token-based unsubscription.
//!
//! [`EventSource<T>`] is the change-notification primitive consumed by the
//! subscription registry: hosts raise it, the engine subscribes to it. It
//! is deliberately simpler than an RAII subscription — the registry owns
//! tokens explicitly because it must tear a host subscription down at a
//! precise point in its entry lifecycle, not at an arbitrary drop site.
//!
//! # Invariants
//!
//! 1. Callbacks fire in registration order.
//! 2. The callback list is snapshotted before a raise, so a callback may
//!    subscribe, unsubscribe, or re-raise without invalidating iteration.
//! 3. A token unsubscribes exactly the callback it was issued for;
//!    unsubscribing twice is a no-op.

use std::cell::RefCell;
use std::rc::Rc;

/// Identifies one registered callback on one [`EventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventToken(u64);

struct SourceInner<T> {
    next_token: u64,
    callbacks: Vec<(u64, Rc<dyn Fn(&T)>)>,
}

/// A single-threaded event: an ordered list of subscriber callbacks.
pub struct EventSource<T> {
    inner: RefCell<SourceInner<T>>,
}

impl<T> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventSource<T> {
    /// Create an event source with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(SourceInner {
                next_token: 0,
                callbacks: Vec::new(),
            }),
        }
    }

    /// Register a callback. It stays live until [`unsubscribe`] is called
    /// with the returned token.
    ///
    /// [`unsubscribe`]: EventSource::unsubscribe
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> EventToken {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.callbacks.push((token, Rc::new(f)));
        EventToken(token)
    }

    /// Remove the callback registered under `token`. Unknown or already
    /// removed tokens are ignored.
    pub fn unsubscribe(&self, token: EventToken) {
        self.inner
            .borrow_mut()
            .callbacks
            .retain(|(id, _)| *id != token.0);
    }

    /// Invoke every subscriber with `payload`, in registration order.
    ///
    /// The subscriber list is snapshotted first: callbacks registered or
    /// removed during the raise take effect from the next raise onward.
    pub fn raise(&self, payload: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self
            .inner
            .borrow()
            .callbacks
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for f in snapshot {
            f(payload);
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    /// Whether no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().callbacks.is_empty()
    }
}

impl<T> std::fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("subscribers", &self.subscriber_count())
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
    use std::rc::Rc;

    #[test]
    fn fires_in_registration_order() {
        let ev: EventSource<()> = EventSource::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let s = Rc::clone(&seen);
            ev.subscribe(move |()| s.borrow_mut().push(i));
        }

        ev.raise(&());
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribe_removes_only_that_callback() {
        let ev: EventSource<i32> = EventSource::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s1 = Rc::clone(&seen);
        let t1 = ev.subscribe(move |v| s1.borrow_mut().push(("a", *v)));
        let s2 = Rc::clone(&seen);
        let _t2 = ev.subscribe(move |v| s2.borrow_mut().push(("b", *v)));

        ev.unsubscribe(t1);
        ev.raise(&7);
        assert_eq!(*seen.borrow(), vec![("b", 7)]);

        // Second unsubscribe with the same token is a no-op.
        ev.unsubscribe(t1);
        assert_eq!(ev.subscriber_count(), 1);
    }

    #[test]
    fn subscribe_during_raise_takes_effect_next_raise() {
        let ev: Rc<EventSource<()>> = Rc::new(EventSource::new());
        let count = Rc::new(RefCell::new(0u32));

        let ev2 = Rc::clone(&ev);
        let count2 = Rc::clone(&count);
        ev.subscribe(move |()| {
            let c = Rc::clone(&count2);
            ev2.subscribe(move |()| *c.borrow_mut() += 1);
        });

        ev.raise(&());
        assert_eq!(*count.borrow(), 0, "new subscriber must not fire mid-raise");

        ev.raise(&());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn payload_passed_by_reference() {
        let ev: EventSource<String> = EventSource::new();
        let seen = Rc::new(RefCell::new(String::new()));
        let s = Rc::clone(&seen);
        ev.subscribe(move |name| *s.borrow_mut() = name.clone());

        ev.raise(&"Age".to_string());
        assert_eq!(*seen.borrow(), "Age");
    }

    #[test]
    fn empty_source_raise_is_noop() {
        let ev: EventSource<u8> = EventSource::new();
        assert!(ev.is_empty());
        ev.raise(&0);
    }
}
