// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Sign-In with Ethereum (EIP-4361) for the gm report API.
//!
//! ## Auth Flow
//!
//! 1. Client fetches a nonce from `GET /api/auth/nonce`
//! 2. Wallet signs a SIWE message naming this service's domain and the nonce
//! 3. Client posts `{ message, signature }` to `POST /api/auth/verify`
//! 4. Server:
//!    - Checks domain, version and time bounds
//!    - Recovers the signer (EIP-191) and compares it to the message address
//!    - Consumes the nonce (single use)
//!    - Creates the user on first sign-in
//!    - Returns an HS256 session token
//! 5. Client sends `Authorization: Bearer <token>` on later requests
//!
//! ## Security
//!
//! - Nonces expire after `NONCE_TTL_SECS` and can be used once
//! - Session tokens expire after `SESSION_TTL_SECS`
//! - Clock skew tolerance is 60 seconds

pub mod error;
pub mod extractor;
pub mod nonce;
pub mod session;
pub mod siwe;
pub mod username;

pub use error::AuthError;
pub use extractor::{OptionalSession, Session};
pub use nonce::{NonceStore, NonceSweeper};
pub use session::{SessionKeys, SessionUser};
pub use siwe::{SiweError, SiweMessage};
pub use username::generate_username;
