//! Cipher module: key derivation, key-stream generation, XOR cipher
//!
//! The arithmetic here is a numeric ABI shared with the runtime
//! ContentDecoder. Every operation is explicitly modular; any deviation
//! silently produces garbage on the decoding side.

/// Master secret combined with each block's salt. Must match the value
/// compiled into the runtime decoder.
pub const MASTER_SECRET: &str = "HexworthPrime2025";

/// Delimiter between key factors. Part of the key-derivation contract.
pub const FACTOR_DELIMITER: &str = "|";

/// Hash an ordered list of key factors into a 31-bit seed.
///
/// Factors are joined with [`FACTOR_DELIMITER`]; order is part of the
/// contract. The running hash is the djb2 recurrence
/// `h = ((h << 5) + h + codepoint) mod 2^32`, seeded at 5381, with the
/// top bit cleared at the end.
pub fn derive_seed(factors: &[&str]) -> u32 {
    hash_string(&factors.join(FACTOR_DELIMITER))
}

/// Seed for one content block: master secret, per-block salt, and the
/// fixed context factors the runtime decoder supplies after the access
/// check passes (empty house, "sorted" flag).
pub fn content_seed(salt: &str) -> u32 {
    derive_seed(&[MASTER_SECRET, salt, "", "sorted"])
}

fn hash_string(s: &str) -> u32 {
    let mut hash: u32 = 5381;
    for c in s.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(c as u32);
    }
    hash & 0x7FFF_FFFF
}

/// Expand a seed into `length` key-stream bytes.
///
/// Linear-congruential recurrence `state = (state * 1103515245 + 12345)
/// mod 2^31`, one output byte (`state mod 256`) per step. Prefix-stable:
/// the first K bytes for any requested length equal the full output for
/// length K.
pub fn keystream(seed: u32, length: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(length);
    let mut state = seed;
    for _ in 0..length {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345) & 0x7FFF_FFFF;
        bytes.push((state % 256) as u8);
    }
    bytes
}

/// XOR `data` against the key-stream for `seed`.
///
/// Self-inverse: applying it twice with the same seed restores the input.
/// The same call serves both the encode and decode directions.
pub fn xor_cipher(data: &[u8], seed: u32) -> Vec<u8> {
    let key = keystream(seed, data.len());
    data.iter().zip(key.iter()).map(|(b, k)| b ^ k).collect()
}
