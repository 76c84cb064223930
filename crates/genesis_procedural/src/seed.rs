//! # Seed Management
//!
//! Hierarchical, deterministic seed derivation.
//!
//! ## Determinism Guarantee
//!
//! A sub-seed depends on nothing but the character sequence of its path
//! and the root seed: no object identity, no map iteration order, no
//! floating point. Given the same root and path, every `SeedManager`
//! produces **exactly** the same [`Seed`].
//!
//! ## Hashing
//!
//! Path segments followed by the root are joined with `"::"` and folded
//! through 64-bit FNV-1a over UTF-16 code units, then rendered as a
//! fixed-width lowercase hex string.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Separator between path segments.
pub const PATH_SEPARATOR: &str = "::";

/// Folds a string through 64-bit FNV-1a.
///
/// Iterates UTF-16 code units so that non-ASCII paths hash the same way
/// everywhere the engine's seeds are shared.
#[must_use]
pub fn fnv1a_64(value: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for unit in value.encode_utf16() {
        hash ^= u64::from(unit);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic token from which all pseudo-randomness for one path is
/// derived.
///
/// Always a 16-digit, zero-padded, lowercase hex string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    /// Creates a seed from a raw 64-bit hash.
    #[inline]
    #[must_use]
    pub fn from_hash(hash: u64) -> Self {
        Self(format!("{hash:016x}"))
    }

    /// Wraps an arbitrary seed string.
    ///
    /// Graph evaluation accepts any string; derived seeds are always hex.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the seed as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of the seed.
    ///
    /// Hex seeds parse directly; any other string is hashed.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        u64::from_str_radix(&self.0, 16).unwrap_or_else(|_| fnv1a_64(&self.0))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Seed {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Derives reproducible sub-seeds from a root seed and a naming path.
///
/// Derivation is memoized per instance, keyed by the joined path, so
/// repeated calls with the same path are a single map lookup.
///
/// # Example
///
/// ```rust
/// use genesis_procedural::SeedManager;
///
/// let seeds = SeedManager::new("GenesisAlpha42");
/// let a = seeds.sub_seed(&["Galaxy", "System7", "Planet3"]);
/// let b = SeedManager::new("GenesisAlpha42").sub_seed(&["Galaxy", "System7", "Planet3"]);
/// assert_eq!(a, b);
/// ```
#[derive(Debug)]
pub struct SeedManager {
    /// Root seed string.
    root: String,
    /// Memoized sub-seeds by joined path.
    memo: RwLock<HashMap<String, Seed>>,
}

impl SeedManager {
    /// Creates a new seed manager from a root seed.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the root seed.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the sub-seed for a path.
    ///
    /// An empty path is legal and derives from the root alone.
    #[must_use]
    pub fn sub_seed<S: AsRef<str>>(&self, path: &[S]) -> Seed {
        let key = join_path(path);
        if let Some(seed) = self.memo.read().get(&key) {
            return seed.clone();
        }

        let data = if path.is_empty() {
            self.root.clone()
        } else {
            format!("{key}{PATH_SEPARATOR}{}", self.root)
        };
        let seed = Seed::from_hash(fnv1a_64(&data));

        self.memo.write().entry(key).or_insert(seed).clone()
    }

    /// Number of memoized paths.
    #[must_use]
    pub fn cached_paths(&self) -> usize {
        self.memo.read().len()
    }
}

impl Clone for SeedManager {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            memo: RwLock::new(self.memo.read().clone()),
        }
    }
}

/// Joins path segments with [`PATH_SEPARATOR`].
fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut joined = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            joined.push_str(PATH_SEPARATOR);
        }
        joined.push_str(segment.as_ref());
    }
    joined
}
