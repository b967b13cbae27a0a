//! The dispatcher: routes inbound envelopes to registered frame callbacks.
//!
//! # Concurrency note
//!
//! `Dispatcher` is NOT thread-safe by itself — handlers live in a plain
//! `HashMap` and `route` takes `&self` with no interior locking beyond
//! what frames bring themselves. The client wraps the session in a mutex
//! at a higher level, which also preserves the delivery guarantee:
//! envelopes are routed one at a time, in wire order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use duskgate_protocol::Envelope;

/// A registered message callback.
type Handler = Box<dyn Fn(&Envelope) + Send + Sync>;

/// A UI frame: one mounted controller rendering a functional area
/// (login, inventory, combat, ...).
///
/// Concrete frames implement this small capability interface instead of
/// inheriting from a controller base class; the behavioral differences
/// between frames are shallow enough that three hooks cover them.
pub trait Frame: Send {
    /// The message kinds this frame consumes.
    fn kinds(&self) -> Vec<String>;

    /// An envelope of one of the advertised kinds arrived.
    fn on_message(&mut self, envelope: &Envelope);

    /// The session became ready (handshake completed).
    fn on_ready(&mut self) {}

    /// The display language changed; re-render static text.
    fn reset_language(&mut self, _lang: &str) {}
}

/// Routes envelopes by kind to whoever registered interest.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Vec<Handler>>,
    /// Frames registered via `register_frame`, kept so broadcast hooks
    /// (`on_ready`, `reset_language`) can reach them.
    frames: Vec<Arc<Mutex<dyn Frame>>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a callback with a message kind.
    ///
    /// Multiple handlers per kind are allowed; `route` invokes them in
    /// registration order.
    pub fn register<F>(&mut self, kind: impl Into<String>, callback: F)
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.handlers
            .entry(kind.into())
            .or_default()
            .push(Box::new(callback));
    }

    /// Wires every kind a frame advertises to its `on_message` hook.
    ///
    /// The frame sits behind `Arc<Mutex<..>>` because several kinds may
    /// point at the same frame, and callbacks need shared access.
    pub fn register_frame(&mut self, frame: Arc<Mutex<dyn Frame>>) {
        let kinds = frame.lock().expect("frame lock poisoned").kinds();
        for kind in kinds {
            let frame = Arc::clone(&frame);
            self.register(kind, move |envelope| {
                frame
                    .lock()
                    .expect("frame lock poisoned")
                    .on_message(envelope);
            });
        }
        self.frames.push(frame);
    }

    /// Fires `on_ready` on every registered frame. The client calls this
    /// once the handshake completes.
    pub fn notify_ready(&self) {
        for frame in &self.frames {
            frame.lock().expect("frame lock poisoned").on_ready();
        }
    }

    /// Tells every registered frame the display language so static text
    /// re-renders.
    pub fn reset_language(&self, lang: &str) {
        for frame in &self.frames {
            frame
                .lock()
                .expect("frame lock poisoned")
                .reset_language(lang);
        }
    }

    /// Routes an envelope to every handler registered for its kind.
    ///
    /// Returns the number of handlers invoked. Zero is not an error:
    /// many push kinds are only relevant to frames not currently
    /// mounted, and dropping those silently is intentional.
    pub fn route(&self, envelope: &Envelope) -> usize {
        match self.handlers.get(&envelope.kind) {
            Some(handlers) => {
                for handler in handlers {
                    handler(envelope);
                }
                tracing::trace!(
                    kind = %envelope.kind,
                    handlers = handlers.len(),
                    "envelope routed"
                );
                handlers.len()
            }
            None => {
                tracing::trace!(kind = %envelope.kind, "envelope dropped, no handler");
                0
            }
        }
    }

    /// Number of handlers registered for a kind.
    pub fn handler_count(&self, kind: &str) -> usize {
        self.handlers.get(kind).map_or(0, Vec::len)
    }
}

// =========================================================================
// Tests
// =========================================================================
