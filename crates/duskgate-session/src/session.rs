//! The session aggregate: everything the client remembers about the
//! connected character between envelopes.
//!
//! A `Session` bundles the per-connection state that survives from one
//! message to the next: the dispatcher wiring, skill cooldowns, the token
//! context for server text, and the current combat target. The client
//! holds one behind a mutex and threads every inbound envelope through it.

use duskgate_protocol::{render, Envelope, EscapeContext};

use crate::{CooldownTracker, Dispatcher};

/// Per-connection client state.
#[derive(Default)]
pub struct Session {
    dispatcher: Dispatcher,
    cooldowns: CooldownTracker,
    escape: EscapeContext,
    /// The currently selected combat target, if any.
    current_target: Option<String>,
}

impl Session {
    /// Creates a fresh session with no frames registered and nothing
    /// tracked.
    pub fn new() -> Self {
        Self::default()
    }

    // =====================================================================
    // Component access
    // =====================================================================

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownTracker {
        &mut self.cooldowns
    }

    pub fn escape_context(&self) -> &EscapeContext {
        &self.escape
    }

    // =====================================================================
    // Routing
    // =====================================================================

    /// Routes an envelope through the dispatcher. Returns the number of
    /// handlers invoked (0 means the kind was silently dropped).
    pub fn route(&self, envelope: &Envelope) -> usize {
        self.dispatcher.route(envelope)
    }

    /// Fires `on_ready` on every registered frame.
    pub fn notify_ready(&self) {
        self.dispatcher.notify_ready();
    }

    /// Forwards a display-language change to every registered frame.
    pub fn reset_language(&self, lang: &str) {
        self.dispatcher.reset_language(lang);
    }

    // =====================================================================
    // Escape context
    // =====================================================================

    /// Wholesale-replaces the escape context, e.g. on character switch.
    ///
    /// Everything the old character contributed is dropped; only the
    /// supplied token/value pairs survive. Cooldowns are cleared at the
    /// same time since they belong to the outgoing character.
    pub fn rebuild_escape_context<I, K, V>(&mut self, name: &str, tokens: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = EscapeContext::new();
        ctx.set("$NAME", name);
        for (token, value) in tokens {
            ctx.set(token, value);
        }
        self.escape = ctx;
        self.cooldowns.clear_all();
        tracing::debug!(character = %name, tokens = self.escape.len(), "escape context rebuilt");
    }

    /// Updates a single token in place, for incremental server pushes
    /// (gold changed, title earned) that don't warrant a full rebuild.
    pub fn set_escape_token(
        &mut self,
        token: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.escape.set(token, value);
    }

    /// Renders server text, substituting `$TOKEN` escapes from the
    /// session's context.
    pub fn render(&self, text: &str) -> String {
        render(text, &self.escape)
    }

    // =====================================================================
    // Target
    // =====================================================================

    /// Selects (or with `None`, deselects) the combat target.
    pub fn set_target(&mut self, target: Option<String>) {
        self.current_target = target;
    }

    /// The currently selected combat target, if any.
    pub fn target(&self) -> Option<&str> {
        self.current_target.as_deref()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use duskgate_protocol::kind;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.dispatcher().handler_count("chat"), 0);
        assert!(session.cooldowns().is_empty());
        assert!(session.escape_context().is_empty());
        assert_eq!(session.target(), None);
    }

    #[test]
    fn test_route_delegates_to_dispatcher() {
        let mut session = Session::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        session.dispatcher_mut().register("chat", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        let envelope = Envelope::new("chat", json!("hello"));
        assert_eq!(session.route(&envelope), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Unregistered kinds drop silently.
        let stray = Envelope::new(kind::COOLDOWN, json!({}));
        assert_eq!(session.route(&stray), 0);
    }

    #[test]
    fn test_rebuild_escape_context_replaces_everything() {
        let mut session = Session::new();
        session.set_escape_token("$GOLD", "100");
        session.rebuild_escape_context("Mira", [("$GOLD", "42")]);

        assert_eq!(session.render("$NAME has $GOLD gold"), "Mira has 42 gold");
        // Only $NAME plus the supplied tokens survive.
        assert_eq!(session.escape_context().len(), 2);
    }

    #[test]
    fn test_rebuild_escape_context_clears_cooldowns() {
        let mut session = Session::new();
        session.cooldowns_mut().update("fireball", 30, 1, 1_000_000);
        assert!(!session.cooldowns().is_empty());

        session
            .rebuild_escape_context("Mira", std::iter::empty::<(String, String)>());
        assert!(session.cooldowns().is_empty());
    }

    #[test]
    fn test_set_escape_token_updates_incrementally() {
        let mut session = Session::new();
        session.rebuild_escape_context("Mira", [("$GOLD", "42")]);
        session.set_escape_token("$GOLD", "43");

        assert_eq!(session.render("$GOLD"), "43");
        // The rest of the context is untouched.
        assert_eq!(session.render("$NAME"), "Mira");
    }

    #[test]
    fn test_render_without_context_passes_tokens_through() {
        let session = Session::new();
        assert_eq!(session.render("hello $GOLD"), "hello $GOLD");
    }

    #[test]
    fn test_target_selection_and_deselection() {
        let mut session = Session::new();
        assert_eq!(session.target(), None);

        session.set_target(Some("rat".to_string()));
        assert_eq!(session.target(), Some("rat"));

        session.set_target(None);
        assert_eq!(session.target(), None);
    }
}
