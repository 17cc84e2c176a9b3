#![forbid(unsafe_code)]

//! Core object model for the Tether binding engine.
//!
//! This crate defines the pieces the engine shares with host objects:
//!
//! - [`Value`]: the dynamic value a binding endpoint stores or produces.
//! - [`EventSource`]: a single-threaded callback list with token-based
//!   unsubscription, the engine's change-notification primitive.
//! - [`Notifying`]: the capability trait an object implements to expose
//!   readable/writable members and change notification.
//! - [`PropertyBag`]: the standard string-keyed [`Notifying`] adaptor.
//!
//! Everything here is single-threaded by construction (`Rc`/`RefCell`);
//! none of these types are `Send`.

pub mod event;
pub mod object;
pub mod value;

pub use event::{EventSource, EventToken};
pub use object::{Notifying, ObjectId, ObjectRef, PropertyBag};
pub use value::Value;
