#![forbid(unsafe_code)]

//! Declarative two-way data binding for arbitrary object graphs.
//!
//! Declare `left == right` once; Tether resolves an initial consistent
//! value and keeps the two sides equal for as long as the binding is
//! live, whichever side changes.
//!
//! ```
//! use std::rc::Rc;
//! use tether::{Expr, PropertyBag, Value, create};
//!
//! let p1 = Rc::new(PropertyBag::with_members([("Age", Value::Int(30))]));
//! let p2 = Rc::new(PropertyBag::with_members([("Age", Value::Int(40))]));
//!
//! let formula = Expr::equal(
//!     Expr::path(Rc::clone(&p1) as _, ["Age"]),
//!     Expr::path(Rc::clone(&p2) as _, ["Age"]),
//! );
//! let binding = create(&formula);
//!
//! // Right side wins initialization.
//! assert_eq!(p1.get("Age"), Some(Value::Int(40)));
//!
//! // Changes on either side propagate to the other.
//! p2.set("Age", 43i64);
//! p2.raise_changed("Age");
//! assert_eq!(p1.get("Age"), Some(Value::Int(43)));
//!
//! binding.unbind();
//! ```
//!
//! The facade crate: everything here re-exports from [`tether_core`],
//! [`tether_expr`], and [`tether_engine`].

pub use tether_core::{
    EventSource, EventToken, Notifying, ObjectId, ObjectRef, PropertyBag, Value,
};
pub use tether_engine::{
    BindError, Binding, CallbackHandle, ListenerGuard, SubscriptionRegistry, add_listener,
    create, notify_member_changed, report, set_value,
};
pub use tether_expr::{
    Accessor, CallFn, EvalError, Expr, Trigger, collect_triggers, eval, resolve,
};
