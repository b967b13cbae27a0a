//! The escape codec: `$TOKEN` substitution in server-supplied text.
//!
//! Servers embed placeholders in display text — `"$PLAYER_NAME strikes!"` —
//! that the client fills in with runtime values before rendering. The
//! syntax is minimal: a token is one `$` followed by digits, underscores,
//! or uppercase letters; the two-character sequence `$$` is a literal `$`.
//!
//! Unknown tokens pass through unchanged. That is deliberate: a server
//! newer than the client may emit tokens the client doesn't know yet, and
//! mangling the text would be worse than showing the raw token.

use std::collections::HashMap;

/// Mapping from placeholder token to replacement string.
///
/// Keys are full token texts including the `$` (e.g. `"$PLAYER_NAME"`).
/// The session rebuilds the whole context whenever the identity of the
/// controlled character changes; [`render`] only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct EscapeContext {
    values: HashMap<String, String>,
}

impl EscapeContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a token's replacement value. Returns `&mut self` so rebuild
    /// sites can chain assignments.
    pub fn set(
        &mut self,
        token: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.values.insert(token.into(), value.into());
        self
    }

    /// Looks up a token's replacement, if any.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Removes every mapping.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of mapped tokens.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when no tokens are mapped.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Is `b` a valid token body byte? Tokens are `$` + one or more of these.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'
}

/// Substitutes escape tokens in `template` using `ctx`.
///
/// Rules, in match order at each `$`:
/// - `$$` emits a single `$`;
/// - `$` + token body emits the context value, or the matched text
///   verbatim when the token isn't in the context;
/// - a `$` followed by anything else passes through untouched.
///
/// Text without `$` is returned unchanged, so the function is idempotent
/// on already-rendered output that contains no dollar signs.
pub fn render(template: &str, ctx: &EscapeContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        // Token bodies are pure ASCII, so byte-wise scanning is safe even
        // in the middle of multi-byte text.
        let body_len = after
            .bytes()
            .take_while(|&b| is_token_byte(b))
            .count();
        if body_len == 0 {
            // Lone `$` not anchored to a token; pass through.
            out.push('$');
            rest = after;
            continue;
        }

        let token = &rest[pos..pos + 1 + body_len];
        match ctx.get(token) {
            Some(value) => out.push_str(value),
            None => out.push_str(token),
        }
        rest = &after[body_len..];
    }

    out.push_str(rest);
    out
}

// =========================================================================
// Tests
// =========================================================================
