//! Random identifier generation.

use rand::RngCore;

/// Generate a random hex token of `len` bytes (`2 * len` hex characters)
pub fn generate_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
