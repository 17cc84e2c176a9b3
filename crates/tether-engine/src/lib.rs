#![forbid(unsafe_code)]

//! The Tether binding engine: declare `left == right` once and the engine
//! keeps the two sides equal for as long as the binding is live.
//!
//! # Architecture
//!
//! [`create`] decomposes a formula into equality bindings (conjunctions
//! become composites). Each equality binding resolves an initial
//! consistent value, collects the `(owner, member)` triggers of both
//! sides, and registers callbacks with the process-wide
//! [`SubscriptionRegistry`]. On notification, the changed side is
//! re-evaluated and — if the value actually differs from the binding's
//! cache — written to the other side. Per-binding change ids suppress
//! the echo notification a binding's own write produces, which is what
//! keeps a two-way binding from oscillating.
//!
//! # Failure Modes
//!
//! Engine conditions degrade gracefully: unsupported formulas and
//! rejected writes are reported on the [`report`] channel and the binding
//! does whatever subset of synchronization remains possible. Only misuse
//! (an empty member identifier) panics.

pub mod binding;
pub mod facade;
pub mod registry;
pub mod report;

pub use binding::{Binding, set_value};
pub use facade::{create, notify_member_changed};
pub use registry::{CallbackHandle, SubscriptionRegistry};
pub use report::{BindError, ListenerGuard, add_listener, report};
