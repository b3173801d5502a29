// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! gm report - Social Video & Attestation Service
//!
//! Short video posts from signed-in wallets, with impact reports recorded as
//! Ethereum Attestation Service (EAS) attestations on those posts.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Sign-In with Ethereum and session tokens
//! - `blockchain` - EAS contract reads for attestation confirmation
//! - `storage` - Embedded database (redb) and video storage

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
