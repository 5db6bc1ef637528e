//! Per-player cache of generated legal actions
//!
//! Entries expire after a fixed time-to-live and are dropped wholesale
//! whenever the match state changes through the engine.

use crate::core::PlayerId;
use crate::game::Action;
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    actions: Vec<Action>,
    created: Instant,
}

#[derive(Debug, Clone)]
pub struct LegalActionCache {
    ttl: Duration,
    entries: FxHashMap<PlayerId, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl LegalActionCache {
    pub fn new(ttl: Duration) -> Self {
        LegalActionCache {
            ttl,
            entries: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached actions for a player, if still fresh
    pub fn get(&mut self, player: PlayerId) -> Option<&[Action]> {
        let fresh = self
            .entries
            .get(&player)
            .is_some_and(|e| e.created.elapsed() < self.ttl);
        if !fresh {
            self.misses += 1;
            self.entries.remove(&player);
            return None;
        }
        self.hits += 1;
        self.entries.get(&player).map(|e| e.actions.as_slice())
    }

    pub fn store(&mut self, player: PlayerId, actions: Vec<Action>) {
        self.entries.insert(
            player,
            CacheEntry {
                actions,
                created: Instant::now(),
            },
        );
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn is_cached(&self, player: PlayerId) -> bool {
        self.entries
            .get(&player)
            .is_some_and(|e| e.created.elapsed() < self.ttl)
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
