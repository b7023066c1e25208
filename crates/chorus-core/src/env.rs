//! Environment abstraction for deterministic testing.
//!
//! Decouples session creation from the system RNG. Production uses
//! [`SystemEnv`]; tests plug in seeded generators so key ids, chain seeds and
//! signing keys are reproducible.

/// Largest sender key id (ids are positive 31-bit integers)
pub const MAX_KEY_ID: u32 = 0x7FFF_FFFF;

/// Source of randomness for new sender key states.
///
/// # Safety
///
/// Implementations MUST use cryptographically secure entropy in production.
/// Chain seeds and signing keys are drawn from here.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    /// Generates a sender key id in `1..=MAX_KEY_ID`.
    fn random_key_id(&self) -> u32 {
        self.random_u32() % MAX_KEY_ID + 1
    }

    /// Generates 32 random bytes (chain seeds, signing seeds).
    fn random_seed(&self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        self.random_bytes(&mut seed);
        seed
    }
}

/// Production environment backed by the OS RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. A process without functioning cryptographic
/// randomness cannot create sender keys securely, and continuing would hand
/// out predictable chain seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - cannot create keys securely");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FixedEnv(u8);

    impl Environment for FixedEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.0);
        }
    }

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();
        assert_ne!(env.random_seed(), env.random_seed(), "Random bytes should differ");
    }

    #[test]
    fn key_id_never_zero() {
        // 0xFFFFFFFF % MAX_KEY_ID == 1, 0 % MAX_KEY_ID == 0
        assert_eq!(FixedEnv(0x00).random_key_id(), 1);
        assert_eq!(FixedEnv(0xFF).random_key_id(), 2);
    }

    #[test]
    fn key_id_within_31_bits() {
        let env = SystemEnv::new();
        for _ in 0..100 {
            let id = env.random_key_id();
            assert!((1..=MAX_KEY_ID).contains(&id));
        }
    }
}
