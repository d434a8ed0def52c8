// crates/repost-conformance-core/src/token.rs
// ============================================================================
// Module: Token Generator
// Description: Seeded random hex tokens for entity defaults.
// Purpose: Give every run unique usernames and names without global state.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Tokens only need to be unique per server, not secret. A run owns exactly
//! one [`TokenGenerator`]; seeding it makes a run reproducible.

use std::fmt::Write;

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Number of random bytes per token (rendered as twice as many hex digits).
pub const TOKEN_BYTES: usize = 8;

/// Seeded source of random hex tokens.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    /// Underlying generator.
    rng: StdRng,
}

impl TokenGenerator {
    /// Creates a generator with a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a generator seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Returns a fresh lowercase hex token.
    pub fn hex_token(&mut self) -> String {
        let mut bytes = [0_u8; TOKEN_BYTES];
        self.rng.fill_bytes(&mut bytes);
        bytes.iter().fold(String::with_capacity(TOKEN_BYTES * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
    }
}
