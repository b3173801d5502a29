// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EAS contract bindings and claim checks.

use alloy::{
    primitives::{Address, B256},
    providers::Provider,
    sol,
};

use super::client::EasError;
use super::types::{AttestationClaim, OnchainAttestation};

sol! {
    #[sol(rpc)]
    interface IEAS {
        struct Attestation {
            bytes32 uid;
            bytes32 schema;
            uint64 time;
            uint64 expirationTime;
            uint64 revocationTime;
            bytes32 refUID;
            address recipient;
            address attester;
            bool revocable;
            bytes data;
        }

        function getAttestation(bytes32 uid) external view returns (Attestation memory);
    }
}

/// EAS contract wrapper.
pub struct EasContract<P> {
    contract: IEAS::IEASInstance<P>,
}

impl<P: Provider + Clone> EasContract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IEAS::new(address, provider.clone()),
        }
    }

    /// Fetch an attestation. Returns `None` when the UID is unknown.
    pub async fn get_attestation(&self, uid: B256) -> Result<Option<OnchainAttestation>, EasError> {
        let raw = self
            .contract
            .getAttestation(uid)
            .call()
            .await
            .map_err(|e| EasError::Rpc(e.to_string()))?;

        // EAS returns a zeroed struct for unknown UIDs.
        if raw.uid.is_zero() {
            return Ok(None);
        }

        Ok(Some(OnchainAttestation {
            uid: raw.uid,
            schema: raw.schema,
            attester: raw.attester,
            recipient: raw.recipient,
            expiration_time: raw.expirationTime,
            revocation_time: raw.revocationTime,
        }))
    }
}

/// Compare what the client claims with the on-chain record.
///
/// `now` is Unix seconds.
pub fn check_claim(
    onchain: &OnchainAttestation,
    claim: &AttestationClaim,
    now: u64,
) -> Result<(), EasError> {
    if onchain.revocation_time != 0 {
        return Err(EasError::Revoked(claim.uid.to_string()));
    }
    if onchain.expiration_time != 0 && onchain.expiration_time <= now {
        return Err(EasError::Expired(claim.uid.to_string()));
    }
    if onchain.schema != claim.schema {
        return Err(EasError::Mismatch {
            field: "schemaId",
            expected: onchain.schema.to_string(),
            actual: claim.schema.to_string(),
        });
    }
    if onchain.attester != claim.attester {
        return Err(EasError::Mismatch {
            field: "attester",
            expected: onchain.attester.to_string(),
            actual: claim.attester.to_string(),
        });
    }
    if onchain.recipient != claim.recipient {
        return Err(EasError::Mismatch {
            field: "recipient",
            expected: onchain.recipient.to_string(),
            actual: claim.recipient.to_string(),
        });
    }
    Ok(())
}
