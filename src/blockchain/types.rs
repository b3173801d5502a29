// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain identifiers, network constants and on-chain attestation types.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// EAS predeploy address on OP-stack chains.
const OP_STACK_EAS: &str = "0x4200000000000000000000000000000000000021";

/// Network configuration for EAS reads.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Which chain this configuration describes
    pub chain: Chain,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// EAS contract address
    pub eas_contract: &'static str,
}

/// Chains the web client attests on.
///
/// Serialized the way the client sends it (`OPTIMISM_MAINNET`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Chain {
    OptimismMainnet,
    OptimismSepolia,
    ScrollSepolia,
}

/// Alias used by configuration code.
pub type EasNetwork = Chain;

impl Chain {
    /// Parse a chain name, ignoring case and underscores.
    ///
    /// Accepts `OPTIMISM_MAINNET`, `optimismMainnet` and the short form `optimism`.
    pub fn parse(s: &str) -> Option<Chain> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "optimism" | "optimismmainnet" => Some(Chain::OptimismMainnet),
            "optimismsepolia" => Some(Chain::OptimismSepolia),
            "scrollsepolia" => Some(Chain::ScrollSepolia),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::OptimismMainnet => 10,
            Chain::OptimismSepolia => 11155420,
            Chain::ScrollSepolia => 534351,
        }
    }

    /// Default network configuration (public RPC endpoint).
    pub fn config(&self) -> NetworkConfig {
        let (rpc_url, eas_contract) = match self {
            Chain::OptimismMainnet => ("https://mainnet.optimism.io", OP_STACK_EAS),
            Chain::OptimismSepolia => ("https://sepolia.optimism.io", OP_STACK_EAS),
            Chain::ScrollSepolia => (
                "https://sepolia-rpc.scroll.io",
                "0xaEF4103A04090071165F78D45D83A0C0782c2B2a",
            ),
        };
        NetworkConfig {
            chain: *self,
            chain_id: self.chain_id(),
            rpc_url: rpc_url.to_string(),
            eas_contract,
        }
    }

    /// EAS explorer URL for an attestation UID.
    pub fn attestation_url(&self, uid: &str) -> String {
        let base = match self {
            Chain::OptimismMainnet => "https://optimism.easscan.org",
            Chain::OptimismSepolia => "https://optimism-sepolia.easscan.org",
            Chain::ScrollSepolia => "https://scroll-sepolia.easscan.org",
        };
        format!("{base}/attestation/view/{uid}")
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::OptimismMainnet => write!(f, "OPTIMISM_MAINNET"),
            Chain::OptimismSepolia => write!(f, "OPTIMISM_SEPOLIA"),
            Chain::ScrollSepolia => write!(f, "SCROLL_SEPOLIA"),
        }
    }
}

/// Attestation record as read from the EAS contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainAttestation {
    pub uid: B256,
    pub schema: B256,
    pub attester: Address,
    pub recipient: Address,
    /// Unix seconds, 0 when the attestation never expires
    pub expiration_time: u64,
    /// Unix seconds, 0 when never revoked
    pub revocation_time: u64,
}

/// The fields a client claims about an attestation it submitted.
#[derive(Debug, Clone)]
pub struct AttestationClaim {
    pub uid: B256,
    pub schema: B256,
    pub attester: Address,
    pub recipient: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_parses_client_and_config_spellings() {
        assert_eq!(Chain::parse("OPTIMISM_MAINNET"), Some(Chain::OptimismMainnet));
        assert_eq!(Chain::parse("optimism"), Some(Chain::OptimismMainnet));
        assert_eq!(Chain::parse("optimismSepolia"), Some(Chain::OptimismSepolia));
        assert_eq!(Chain::parse("SCROLL_SEPOLIA"), Some(Chain::ScrollSepolia));
        assert_eq!(Chain::parse("fuji"), None);
    }

    #[test]
    fn chain_serializes_like_the_client() {
        let json = serde_json::to_string(&Chain::ScrollSepolia).unwrap();
        assert_eq!(json, r#""SCROLL_SEPOLIA""#);
        assert_eq!(Chain::ScrollSepolia.to_string(), "SCROLL_SEPOLIA");
    }

    #[test]
    fn explorer_urls() {
        assert_eq!(
            Chain::OptimismMainnet.attestation_url("0x01"),
            "https://optimism.easscan.org/attestation/view/0x01"
        );
    }

    #[test]
    fn scroll_uses_its_own_eas_deployment() {
        let config = Chain::ScrollSepolia.config();
        assert_eq!(config.chain_id, 534351);
        assert_ne!(config.eas_contract, OP_STACK_EAS);
    }
}
