//! Ratchet limits.

/// Default largest iteration gap a receiver will walk forward
pub const DEFAULT_MAX_SKIP: u32 = 2000;

/// Default skipped message keys retained per state
pub const DEFAULT_MAX_MESSAGE_KEYS: usize = 2000;

/// Default sender key states retained per record
pub const DEFAULT_MAX_STATES: usize = 5;

/// Limits applied by the session builder and group cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderKeyConfig {
    /// Largest accepted `target - current` iteration gap on decrypt.
    /// Bounds the work and memory an attacker can force with one message.
    pub max_skip: u32,
    /// Skipped message keys kept per state; the lowest iteration is evicted
    /// first once the cache is full.
    pub max_message_keys: usize,
    /// States kept per record; the oldest is evicted first.
    pub max_states: usize,
}

impl Default for SenderKeyConfig {
    fn default() -> Self {
        Self {
            max_skip: DEFAULT_MAX_SKIP,
            max_message_keys: DEFAULT_MAX_MESSAGE_KEYS,
            max_states: DEFAULT_MAX_STATES,
        }
    }
}
