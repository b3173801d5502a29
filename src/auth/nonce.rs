// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-use SIWE nonces.
//!
//! Nonces live in a bounded in-process LRU with a TTL. A nonce is removed the
//! moment it is consumed, so a signed message can only be exchanged for a
//! session once. When the cache is full the least recently issued nonce is
//! evicted, which only costs that client a retry.
//!
//! [`NonceSweeper`] prunes expired entries in the background and stops on a
//! `CancellationToken`, the same way the other background tasks do.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;
use rand::distr::{Alphanumeric, SampleString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum number of outstanding nonces.
pub const DEFAULT_NONCE_CAPACITY: usize = 10_000;

/// Nonce length (EIP-4361 requires at least 8 alphanumeric characters).
const NONCE_LEN: usize = 17;

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process store of issued, not yet consumed nonces.
pub struct NonceStore {
    cache: Mutex<LruCache<String, Instant>>,
    ttl: Duration,
}

impl NonceStore {
    /// Create a new store with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Generate and remember a fresh nonce.
    pub fn issue(&self) -> String {
        let nonce = Alphanumeric.sample_string(&mut rand::rng(), NONCE_LEN);
        self.lock().put(nonce.clone(), Instant::now());
        nonce
    }

    /// Remove `nonce`. Returns `true` only if it was issued and has not expired.
    pub fn consume(&self, nonce: &str) -> bool {
        match self.lock().pop(nonce) {
            Some(issued_at) => issued_at.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Drop every expired nonce. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut cache = self.lock();
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, issued_at)| issued_at.elapsed() >= self.ttl)
            .map(|(nonce, _)| nonce.clone())
            .collect();
        for nonce in &expired {
            cache.pop(nonce);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cache only holds timestamps, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, Instant>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            warn!("Nonce store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Background task that prunes expired nonces.
pub struct NonceSweeper {
    store: Arc<NonceStore>,
    interval: Duration,
}

impl NonceSweeper {
    pub fn new(store: Arc<NonceStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(NonceSweeper::new(store).run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Nonce sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Nonce sweeper shutting down");
                    return;
                }
            }

            let removed = self.store.sweep();
            if removed > 0 {
                debug!(removed, remaining = self.store.len(), "Swept expired nonces");
            }
        }
    }
}
