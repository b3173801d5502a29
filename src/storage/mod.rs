// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in two places:
//!
//! ```text
//! {DATA_DIR}/
//!   gm-report.redb   # posts, attestations, users, gm posts
//!   media/           # uploaded videos (local media backend only)
//! ```
//!
//! With the `supabase` media backend, videos go to a storage bucket instead
//! and only the database stays on disk.

pub mod database;
pub mod media;

pub use database::{AppDatabase, DbError, DbResult};
pub use media::{MediaError, MediaStore};
