//! Sharded string interner.
//!
//! Backs the guest symbol table: one entry per distinct string for the
//! lifetime of the process, O(1) interning and lookup, and per-shard locking
//! so inserts stay serialized even when a host embeds the runtime in a
//! multi-threaded program.

use super::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-shard storage for interned strings.
struct InternShard {
    /// Map from string content to local index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Shard exceeded capacity.
    ShardOverflow { shard_idx: usize, count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::ShardOverflow { shard_idx, count } => write!(
                f,
                "interner shard {shard_idx} exceeded capacity: {count} strings, max is {}",
                Name::MAX_LOCAL
            ),
        }
    }
}

impl std::error::Error for InternError {}

impl InternShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        }
    }

    fn with_empty() -> Self {
        let mut shard = Self::new();
        // Pre-intern empty string at index 0
        let empty: &'static str = "";
        shard.map.insert(empty, 0);
        shard.strings.push(empty);
        shard
    }
}

/// Sharded string interner.
///
/// Strings are leaked on first insertion, so every lookup can hand out a
/// `'static` reference and a `Name` stays valid for the rest of the process.
pub struct StringInterner {
    shards: [RwLock<InternShard>; Name::NUM_SHARDS],
    /// Total count of interned strings across all shards.
    total_count: AtomicUsize,
}

impl StringInterner {
    /// Create a new interner with the runtime's well-known method names.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(InternShard::with_empty())
            } else {
                RwLock::new(InternShard::new())
            }
        });

        let interner = Self {
            shards,
            total_count: AtomicUsize::new(1),
        };
        interner.pre_intern_well_known();
        interner
    }

    /// Compute shard for a string based on its hash.
    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Name::NUM_SHARDS
    }

    /// Try to intern a string, returning its Name or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        let shard_idx = Self::shard_for(s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_idx_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        // Fast path: already interned
        {
            let guard = shard.read();
            if let Some(&local) = guard.map.get(s) {
                return Ok(Name::new(shard_idx_u32, local));
            }
        }

        let mut guard = shard.write();

        // Another writer may have won the race for the write lock.
        if let Some(&local) = guard.map.get(s) {
            return Ok(Name::new(shard_idx_u32, local));
        }

        let local = u32::try_from(guard.strings.len())
            .ok()
            .filter(|local| *local <= Name::MAX_LOCAL)
            .ok_or(InternError::ShardOverflow {
                shard_idx,
                count: guard.strings.len(),
            })?;

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);

        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(Name::new(shard_idx_u32, local))
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if a shard exceeds capacity. Use `try_intern` for fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Look up the string for a Name.
    ///
    /// All interned strings are leaked, so the reference is `'static`.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.shards[name.shard()].read();
        guard.strings.get(name.local()).copied().unwrap_or("")
    }

    /// Snapshot every interned string together with its `Name`.
    ///
    /// Order is shard-major and otherwise unspecified.
    pub fn entries(&self) -> Vec<(Name, &'static str)> {
        let mut out = Vec::with_capacity(self.len());
        for (shard_idx, shard) in self.shards.iter().enumerate() {
            let guard = shard.read();
            for (local, s) in guard.strings.iter().enumerate() {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "shard and local indices are bounded at insertion"
                )]
                out.push((Name::new(shard_idx as u32, local as u32), *s));
            }
        }
        out
    }

    /// Pre-intern the method names the runtime dispatches on every call.
    fn pre_intern_well_known(&self) {
        const WELL_KNOWN: &[&str] = &[
            "initialize",
            "method_missing",
            "respond_to_missing?",
            "singleton_method_added",
            "exception",
            "new",
            "==",
            "self",
            "$LOADED_FEATURES",
            "$LOAD_PATH",
        ];

        for name in WELL_KNOWN {
            self.intern(name);
        }
    }

    /// Get the number of interned strings (O(1)).
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// Check if the interner only holds the empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for looking up interned string names.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Shared interner handle.
///
/// Runtimes that should see the same symbols clone one `SharedInterner`;
/// runtimes built independently get independent tables.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }

    /// Whether two handles refer to the same table.
    pub fn same_table(&self, other: &SharedInterner) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
