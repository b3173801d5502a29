// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only Ethereum Attestation Service (EAS) integration.
//!
//! This module provides functionality for:
//! - Chain constants for the networks the web client attests on
//! - Reading attestations from the EAS contract over JSON-RPC
//! - Checking a submitted attestation against its on-chain record

pub mod client;
pub mod eas;
pub mod types;

pub use client::{EasClient, EasError};
pub use types::*;
