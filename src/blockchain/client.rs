// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for reading attestations from EAS.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use chrono::Utc;

use super::eas::{check_claim, EasContract};
use super::types::*;

/// Upper bound on a single EAS lookup.
const RPC_TIMEOUT: Duration = Duration::from_secs(15);

/// Read-only EAS client bound to one network.
pub struct EasClient {
    network: NetworkConfig,
    contract: EasContract<DynProvider>,
}

impl EasClient {
    /// Create a new client for the specified network.
    pub fn new(network: NetworkConfig) -> Result<Self, EasError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| EasError::InvalidRpcUrl(e.to_string()))?;

        let eas_address = Address::from_str(network.eas_contract)
            .map_err(|e| EasError::InvalidRpcUrl(format!("bad EAS address: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        let contract = EasContract::new(&provider, eas_address);

        Ok(Self { network, contract })
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Confirm that `claim` matches a live attestation on this network.
    ///
    /// `chain` is the chain name the client submitted with the attestation.
    pub async fn confirm(
        &self,
        chain: &str,
        claim: &AttestationClaim,
    ) -> Result<OnchainAttestation, EasError> {
        match Chain::parse(chain) {
            Some(c) if c == self.network.chain => {}
            _ => {
                return Err(EasError::WrongChain {
                    expected: self.network.chain,
                    actual: chain.to_string(),
                })
            }
        }

        let lookup = self.contract.get_attestation(claim.uid);
        let onchain = tokio::time::timeout(RPC_TIMEOUT, lookup)
            .await
            .map_err(|_| EasError::Rpc("EAS lookup timed out".to_string()))??
            .ok_or_else(|| EasError::NotFound(claim.uid.to_string()))?;

        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        check_claim(&onchain, claim, now)?;

        tracing::info!(
            uid = %claim.uid,
            chain_id = self.network.chain_id,
            explorer = %self.network.chain.attestation_url(&claim.uid.to_string()),
            "Attestation confirmed on-chain"
        );
        Ok(onchain)
    }
}

/// Errors that can occur while confirming attestations.
#[derive(Debug, thiserror::Error)]
pub enum EasError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Attestation {0} was not found on-chain")]
    NotFound(String),

    #[error("Attestation {0} has been revoked")]
    Revoked(String),

    #[error("Attestation {0} has expired")]
    Expired(String),

    #[error("Attestation {field} does not match the on-chain record")]
    Mismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("This service only accepts attestations on {expected}, got {actual}")]
    WrongChain { expected: Chain, actual: String },
}
