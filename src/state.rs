// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{NonceStore, SessionKeys};
use crate::blockchain::EasClient;
use crate::storage::{AppDatabase, MediaStore};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<AppDatabase>,
    pub media: Arc<MediaStore>,
    pub sessions: Arc<SessionKeys>,
    pub nonces: Arc<NonceStore>,
    /// Domain SIWE messages must name.
    pub siwe_domain: Arc<str>,
    /// On-chain attestation checks; `None` records attestations as submitted.
    pub eas: Option<Arc<EasClient>>,
}

impl AppState {
    pub fn new(
        db: AppDatabase,
        media: MediaStore,
        sessions: SessionKeys,
        nonces: Arc<NonceStore>,
        siwe_domain: &str,
    ) -> Self {
        Self {
            db: Arc::new(db),
            media: Arc::new(media),
            sessions: Arc::new(sessions),
            nonces,
            siwe_domain: Arc::from(siwe_domain),
            eas: None,
        }
    }

    /// Enable on-chain confirmation of submitted attestations.
    pub fn with_eas(mut self, client: EasClient) -> Self {
        self.eas = Some(Arc::new(client));
        self
    }
}

/// State backed by a temporary directory, for tests.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    use std::time::Duration;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = AppDatabase::open(&dir.path().join("test.redb")).expect("Failed to open database");
    let media = MediaStore::Local {
        dir: dir.path().join("media"),
        public_base_url: "http://localhost:8080".to_string(),
    };
    let sessions = SessionKeys::new("test-secret", Duration::from_secs(3600));
    let nonces = Arc::new(NonceStore::new(64, Duration::from_secs(600)));
    let state = AppState::new(db, media, sessions, nonces, "localhost:3000");
    (state, dir)
}
