//! Advisory lock key shared by cooperating runners.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the transaction-scoped advisory lock taken around every migration.
///
/// All runners that must exclude each other on the same database have to use
/// the same key. Services sharing one database but managing unrelated
/// migration sets can pick distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockKey(i64);

impl LockKey {
    /// Key used when none is configured.
    pub const DEFAULT: LockKey = LockKey(123456);

    pub const fn new(key: i64) -> Self {
        Self(key)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Default for LockKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LockKey {
    fn from(key: i64) -> Self {
        Self(key)
    }
}
