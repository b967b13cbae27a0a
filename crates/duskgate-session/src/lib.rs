//! Session layer for Duskgate.
//!
//! This crate is the hub UI frames plug into:
//!
//! 1. **Dispatch** — frames register interest in message kinds and get
//!    routed callbacks ([`Dispatcher`], [`Frame`]).
//! 2. **Derived state** — skill cooldowns, escape-token context, and the
//!    current target, all owned here and read-only to frames
//!    ([`CooldownTracker`], [`Session`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! UI frames (above)      ← register handlers, read cooldowns/targets
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below) ← provides Envelope, escape rendering
//! ```
//!
//! Nothing here touches any UI. The dispatcher only invokes registered
//! callbacks; what a frame does with an envelope is its own business.

mod cooldown;
mod dispatcher;
mod session;

pub use cooldown::CooldownTracker;
pub use dispatcher::{Dispatcher, Frame};
pub use session::Session;
