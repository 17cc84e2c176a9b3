//! The global error channel.
//!
//! Engine conditions that must not crash the host — unsupported formulas,
//! rejected writes — are *reported*, not raised. The channel broadcasts a
//! human-readable string to every attached listener; the default sink is
//! a `tracing` warning, so a host with no listeners still gets
//! diagnostics in its log.
//!
//! Listener removal is RAII ([`ListenerGuard`]), matching how the rest of
//! the engine hands out scoped registrations.

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static LISTENERS: RefCell<Listeners> = RefCell::new(Listeners {
        next_id: 0,
        entries: Vec::new(),
    });
}

struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Rc<dyn Fn(&str)>)>,
}

/// Reportable engine conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The top-level formula node is neither an equality nor a
    /// conjunction.
    UnsupportedFormula { kind: &'static str },
    /// A propagation target was not a writable member access.
    WriteRejected { detail: String },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormula { kind } => {
                write!(
                    f,
                    "unsupported formula: top-level node is a {kind}, expected '==' or '&&'"
                )
            }
            Self::WriteRejected { detail } => write!(f, "write rejected: {detail}"),
        }
    }
}

impl std::error::Error for BindError {}

/// Broadcast `message` to the diagnostic log and every attached listener.
pub fn report(message: &str) {
    tracing::warn!(target: "tether", "{message}");
    let snapshot: Vec<Rc<dyn Fn(&str)>> = LISTENERS.with(|l| {
        l.borrow()
            .entries
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect()
    });
    for f in snapshot {
        f(message);
    }
}

/// Report a [`BindError`].
pub fn report_error(err: &BindError) {
    report(&err.to_string());
}

/// Attach a listener to the error channel. It stays attached until the
/// returned guard is dropped.
#[must_use]
pub fn add_listener(f: impl Fn(&str) + 'static) -> ListenerGuard {
    LISTENERS.with(|l| {
        let mut l = l.borrow_mut();
        let id = l.next_id;
        l.next_id += 1;
        l.entries.push((id, Rc::new(f)));
        ListenerGuard { id }
    })
}

/// RAII removal of an error-channel listener.
pub struct ListenerGuard {
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let id = self.id;
        LISTENERS.with(|l| l.borrow_mut().entries.retain(|(i, _)| *i != id));
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard").field("id", &self.id).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_receives_reports() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _guard = add_listener(move |msg| s.borrow_mut().push(msg.to_string()));

        report("first");
        report("second");
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn dropped_guard_detaches() {
        let seen = Rc::new(RefCell::new(0u32));
        let s = Rc::clone(&seen);
        let guard = add_listener(move |_| *s.borrow_mut() += 1);

        report("x");
        drop(guard);
        report("y");
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn error_display() {
        let err = BindError::UnsupportedFormula { kind: "constant" };
        assert!(err.to_string().contains("constant"));

        let err = BindError::WriteRejected {
            detail: "target is a call".into(),
        };
        assert!(err.to_string().contains("call"));
    }
}
