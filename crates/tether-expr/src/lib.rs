#![forbid(unsafe_code)]

//! Expression trees and their evaluation for the Tether binding engine.
//!
//! The engine consumes an already-parsed, immutable [`Expr`] tree — this
//! crate defines that tree plus the three pure operations over it:
//!
//! - [`eval`]: reduce any node to a [`Value`](tether_core::Value).
//! - [`resolve`]: turn a member-access node into a live [`Accessor`].
//! - [`collect_triggers`]: list every `(owner, member)` pair a sub-tree's
//!   value depends on.
//!
//! Producing trees (e.g. from a host-language formula) is the caller's
//! business; the engine never mutates one.

pub mod accessor;
pub mod eval;
pub mod tree;
pub mod triggers;

pub use accessor::{Accessor, resolve};
pub use eval::{EvalError, eval};
pub use tree::{CallFn, Expr};
pub use triggers::{Trigger, collect_triggers};
