//! # Audio Cache
//!
//! Maps narration text to a playable clip or fetch status.
//!
//! Entries are keyed by the exact narration text rather than by chunk
//! identity, so identical text across chunks shares one fetch. The cache
//! lives for one installment; loading a new installment discards it
//! wholesale.

use bytes::Bytes;
use std::collections::HashMap;

/// State of one cached narration text.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// A fetch is in flight. The generation identifies which fetch owns the
    /// entry so a superseded completion can be recognized and discarded.
    Fetching { generation: u64 },
    /// The clip is available for playback.
    Ready(Bytes),
    /// The fetch failed. Kept so the failure is not retried automatically;
    /// a fresh fetch only happens after the cache is invalidated.
    Failed,
}

impl CacheEntry {
    /// Returns `true` if a clip is available for playback.
    pub fn is_ready(&self) -> bool {
        matches!(self, CacheEntry::Ready(_))
    }
}

/// Counters for cache behavior, exposed for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a ready clip.
    pub hits: u64,
    /// Lookups that found nothing playable.
    pub misses: u64,
    /// Completions discarded because their generation was superseded.
    pub stale_discards: u64,
    /// Fetches that completed with an error.
    pub failures: u64,
}

/// Text-keyed store of narration clips and fetch markers.
///
/// The cache itself is passive; [`NarrationController`](crate::controller::NarrationController)
/// owns it and enforces the single-flight and suppression rules.
#[derive(Debug, Default)]
pub struct AudioCache {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl AudioCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for a text, if any.
    pub fn entry(&self, text: &str) -> Option<&CacheEntry> {
        self.entries.get(text)
    }

    /// Return the playable clip for a text, counting a hit or miss.
    pub fn clip(&mut self, text: &str) -> Option<Bytes> {
        match self.entries.get(text) {
            Some(CacheEntry::Ready(clip)) => {
                self.stats.hits += 1;
                Some(clip.clone())
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Returns `true` if a fetch for this text would be redundant: a clip is
    /// ready, a fetch is already in flight, or a previous fetch failed.
    pub fn has_entry(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// Register an in-flight fetch under the given generation.
    pub fn begin_fetch(&mut self, text: &str, generation: u64) {
        self.entries
            .insert(text.to_string(), CacheEntry::Fetching { generation });
    }

    /// Commit a successful fetch. The clip is stored only when the entry is
    /// still the fetching marker registered under the same generation;
    /// otherwise the result is stale and dropped.
    ///
    /// Returns `true` when the clip was stored.
    pub fn commit_ready(&mut self, text: &str, generation: u64, clip: Bytes) -> bool {
        match self.entries.get(text) {
            Some(CacheEntry::Fetching { generation: owner }) if *owner == generation => {
                self.entries.insert(text.to_string(), CacheEntry::Ready(clip));
                true
            }
            _ => {
                self.stats.stale_discards += 1;
                false
            }
        }
    }

    /// Commit a failed fetch under the same identity rule as
    /// [`commit_ready`](Self::commit_ready).
    ///
    /// Returns `true` when the failure marker was stored.
    pub fn commit_failed(&mut self, text: &str, generation: u64) -> bool {
        match self.entries.get(text) {
            Some(CacheEntry::Fetching { generation: owner }) if *owner == generation => {
                self.entries.insert(text.to_string(), CacheEntry::Failed);
                self.stats.failures += 1;
                true
            }
            _ => {
                self.stats.stale_discards += 1;
                false
            }
        }
    }

    /// Remove the fetching marker registered under the given generation,
    /// freeing the text for a future fetch. Ready and failed entries are
    /// left alone.
    pub fn cancel_fetch(&mut self, text: &str, generation: u64) {
        if let Some(CacheEntry::Fetching { generation: owner }) = self.entries.get(text) {
            if *owner == generation {
                self.entries.remove(text);
            }
        }
    }

    /// Discard every entry. Used when a new installment is loaded.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    /// Number of entries currently held (any state).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
