//! Pending/completed number queue.

use courier_core::phone::digit_core;

/// Ordered queue of phone numbers awaiting and past dispatch.
///
/// A number lives in at most one of the two sequences at any time.
/// Identity is the digit-only core, so a decorated duplicate of an
/// already-queued number is rejected on insert. Processing order is
/// insertion order.
#[derive(Debug, Default)]
pub struct Queue {
    pending: Vec<String>,
    completed: Vec<String>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one number at the tail of pending. Returns whether it was
    /// added; digitless input and duplicates of anything already queued
    /// or completed are rejected.
    pub fn insert(&mut self, raw: &str) -> bool {
        let core = digit_core(raw);
        if core.is_empty() || self.contains_core(&core) {
            return false;
        }
        self.pending.push(raw.trim().to_string());
        true
    }

    fn contains_core(&self, core: &str) -> bool {
        self.pending
            .iter()
            .chain(self.completed.iter())
            .any(|n| digit_core(n) == core)
    }

    /// Pop the next pending number (FIFO).
    pub fn pop_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub fn push_completed(&mut self, number: String) {
        self.completed.push(number);
    }

    /// Move every completed number back to the tail of pending, keeping
    /// their relative order. Returns how many moved.
    pub fn resend_completed(&mut self) -> usize {
        let moved = self.completed.len();
        self.pending.append(&mut self.completed);
        moved
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }
}

/// Split a pasted block into importable numbers.
///
/// Tokens are split on newlines, commas and semicolons, trimmed, and kept
/// only when they look like a phone number: optional leading `+`, then
/// digits, spaces, hyphens and parentheses, with at least one digit.
/// Duplicates within the block are dropped.
pub fn parse_import(raw: &str) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for token in raw.split(['\n', ',', ';']) {
        let token = token.trim();
        if !is_phone_like(token) {
            continue;
        }
        if numbers.iter().any(|n| n == token) {
            continue;
        }
        numbers.push(token.to_string());
    }
    numbers
}

fn is_phone_like(token: &str) -> bool {
    let rest = token.strip_prefix('+').unwrap_or(token);
    rest.chars().any(|c| c.is_ascii_digit())
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}
