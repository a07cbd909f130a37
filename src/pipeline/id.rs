// src/pipeline/id.rs

//! Run identifiers.

use std::fmt;

use rand::Rng;

/// Symbols a run id is drawn from.
pub const RUN_ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of symbols in a run id.
pub const RUN_ID_LEN: usize = 8;

/// Short identifier of one run, used for log correlation and to keep
/// workspace and object names apart.
///
/// 36^8 values: plenty within one process lifetime, not a security token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        RunId(value.to_string())
    }
}

/// Generate a fresh run id, uniformly over [`RUN_ID_ALPHABET`].
pub fn generate_run_id() -> RunId {
    let mut rng = rand::thread_rng();
    let id = (0..RUN_ID_LEN)
        .map(|_| RUN_ID_ALPHABET[rng.gen_range(0..RUN_ID_ALPHABET.len())] as char)
        .collect();
    RunId(id)
}
