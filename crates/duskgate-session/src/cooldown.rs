//! Skill cooldown tracking.
//!
//! The server acknowledges a skill cast with two figures: the skill's own
//! cooldown and the global cooldown (GCD) that floors every other skill.
//! The tracker stores absolute expiry timestamps and enforces one
//! invariant throughout: an expiry only ever moves forward, except when
//! explicitly cleared.
//!
//! Timestamps are plain `u64` milliseconds since the epoch, passed in by
//! the caller. Taking `now` as a parameter (instead of reading the clock
//! here) keeps every rule testable without sleeping.

use std::collections::HashMap;

/// Tracks per-skill cooldown expiries. Owned exclusively by the session;
/// frames read through it, never write.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    /// Absolute expiry per skill, milliseconds since epoch.
    expiries: HashMap<String, u64>,
}

impl CooldownTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a skill-cast acknowledgement.
    ///
    /// Raises `skill_id`'s expiry to `now + cooldown_secs`, then raises
    /// every other tracked skill's expiry to at least
    /// `now + global_cooldown_secs` — both under the monotonic-forward
    /// rule, so a stale acknowledgement can never shorten a cooldown.
    /// An individual skill may therefore sit above the GCD floor while
    /// the floor still applies uniformly to the rest.
    pub fn update(
        &mut self,
        skill_id: &str,
        cooldown_secs: u64,
        global_cooldown_secs: u64,
        now_ms: u64,
    ) {
        let skill_expiry = now_ms + cooldown_secs * 1000;
        let floor = now_ms + global_cooldown_secs * 1000;

        raise(
            self.expiries.entry(skill_id.to_string()).or_insert(0),
            skill_expiry,
        );

        for (id, expiry) in self.expiries.iter_mut() {
            if id != skill_id {
                raise(expiry, floor);
            }
        }

        tracing::debug!(
            skill = %skill_id,
            cooldown_secs,
            global_cooldown_secs,
            "cooldown updated"
        );
    }

    /// Milliseconds until `skill_id` is ready: `max(0, expiry - now)`.
    /// Unknown skills are ready, so 0.
    pub fn remaining(&self, skill_id: &str, now_ms: u64) -> u64 {
        self.expiries
            .get(skill_id)
            .map_or(0, |expiry| expiry.saturating_sub(now_ms))
    }

    /// The stored absolute expiry, if the skill is tracked.
    pub fn expiry(&self, skill_id: &str) -> Option<u64> {
        self.expiries.get(skill_id).copied()
    }

    /// Explicitly clears one skill — the only way an expiry goes back.
    pub fn clear(&mut self, skill_id: &str) {
        self.expiries.remove(skill_id);
    }

    /// Drops every tracked cooldown (e.g. on character switch).
    pub fn clear_all(&mut self) {
        self.expiries.clear();
    }

    /// Number of tracked skills.
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    /// `true` when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

/// Monotonic-forward assignment: stores `candidate` only if greater.
fn raise(slot: &mut u64, candidate: u64) {
    if candidate > *slot {
        *slot = candidate;
    }
}

// =========================================================================
// Tests
// =========================================================================
