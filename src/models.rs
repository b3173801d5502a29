// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the stored records and the request and response
//! structures used by the REST API. JSON keys are camelCase, matching the
//! web client.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum addresses in their EIP-55
//! checksummed form. Two addresses are equal regardless of the casing the
//! client sent, because both are normalized on the way in.
//!
//! ## Model Categories
//!
//! - **Posts**: Video posts and the attestations attached to them
//! - **Attestations**: EAS records of an emotional reaction and impact rating
//! - **Users**: Wallets that have signed in with Ethereum
//! - **GmPosts**: Unauthenticated uploads

use std::str::FromStr;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum wallet address, always stored checksummed.
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::parse("0x742d35cc6634c0532925a3b844bc9e7595f4ab12").unwrap();
/// assert_eq!(addr.as_str(), "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Parse any-case hex into the checksummed form. `None` if not an address.
    pub fn parse(raw: &str) -> Option<Self> {
        Address::from_str(raw.trim()).ok().map(Self::from)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_address(&self) -> Option<Address> {
        Address::from_str(&self.0).ok()
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Address> for WalletAddress {
    fn from(value: Address) -> Self {
        // Display for Address is EIP-55 checksummed.
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Post Models
// =============================================================================

/// A video post.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// UUID of the post.
    pub id: String,
    pub title: String,
    pub content: String,
    /// Public URL of the uploaded video.
    pub media_url: String,
    /// Address of the uploader.
    pub author: WalletAddress,
    /// Interviewees and co-authors. The first entry is the interviewee.
    pub collaborators: Vec<WalletAddress>,
    /// One entry per attestation, in submission order.
    pub attesters: Vec<WalletAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post together with its attestations (newest first).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAttestations {
    #[serde(flatten)]
    pub post: Post,
    pub attestations: Vec<Attestation>,
}

/// Fields a new post is created from.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub media_url: String,
    pub author: WalletAddress,
}

/// Partial update for a post. Unknown fields are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media_url: Option<String>,
    /// Appended to the existing collaborators; duplicates are skipped.
    pub collaborators: Option<Vec<String>>,
}

/// Normalized form of [`UpdatePostRequest`].
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub collaborators: Vec<WalletAddress>,
}

// =============================================================================
// Attestation Models
// =============================================================================

/// Emotional reaction recorded by an attestation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Like,
    Care,
    Surprise,
    Fun,
    Learning,
    Dislike,
    Sad,
    Angry,
    Uncomfortable,
    Trash,
}

/// An EAS attestation attached to a post. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    /// On-chain attestation UID.
    pub id: String,
    pub tx_id: String,
    /// Chain name as submitted (e.g. `OPTIMISM_MAINNET`).
    pub chain: String,
    pub schema_id: String,
    pub attester: WalletAddress,
    pub recipient: WalletAddress,
    pub emotion: Emotion,
    /// Impact rating, 1 to 5.
    pub impact: u8,
    /// `interviewee` or `audience` in the web client.
    pub attester_role: String,
    /// `TRUE_STORY` or `IMPACT_REPORT` in the web client.
    pub category: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

/// An attestation with the post it belongs to (without nested attestations).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttestationWithPost {
    #[serde(flatten)]
    pub attestation: Attestation,
    pub post: Post,
}

/// Body of `POST /api/attestations`.
///
/// Every field is optional at the type level so that a missing field yields
/// the shared "Missing variables in request" error instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttestationRequest {
    /// Defaults to `txId` when absent.
    pub attestation_id: Option<String>,
    pub tx_id: Option<String>,
    pub chain: Option<String>,
    pub schema_id: Option<String>,
    pub attester: Option<String>,
    pub recipient: Option<String>,
    pub emotion: Option<Emotion>,
    pub impact: Option<u8>,
    pub attester_role: Option<String>,
    pub category: Option<String>,
    pub post_id: Option<String>,
    pub connected_address: Option<String>,
}

// =============================================================================
// User Models
// =============================================================================

/// A wallet that has signed in with Ethereum.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Checksummed wallet address.
    pub id: WalletAddress,
    /// Random camelCase slug, e.g. `braveOtterCalm`.
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// GmPost Models
// =============================================================================

/// A post created through the unauthenticated upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GmPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub media_url: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostWithAttestations>,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub post: PostWithAttestations,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatedPostResponse {
    pub post: Post,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedPostResponse {
    pub post: Post,
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttestationListResponse {
    pub attestations: Vec<AttestationWithPost>,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAttestationResponse {
    pub updated_post: PostWithAttestations,
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedGmPostResponse {
    pub post: GmPost,
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GmPostListResponse {
    pub posts: Vec<GmPost>,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_is_checksummed() {
        let lower = WalletAddress::parse("0x742d35cc6634c0532925a3b844bc9e7595f4ab12").unwrap();
        let upper = WalletAddress::parse("0x742D35CC6634C0532925A3B844BC9E7595F4AB12").unwrap();
        assert_eq!(lower, upper);
        assert_ne!(lower.as_str(), lower.as_str().to_lowercase());
        assert!(WalletAddress::parse("0x1234").is_none());
        assert!(WalletAddress::parse("").is_none());
    }

    #[test]
    fn emotion_uses_lowercase_names() {
        let emotion: Emotion = serde_json::from_str(r#""uncomfortable""#).unwrap();
        assert_eq!(emotion, Emotion::Uncomfortable);
        assert!(serde_json::from_str::<Emotion>(r#""bored""#).is_err());
    }

    #[test]
    fn post_with_attestations_is_flat_camel_case() {
        let now = Utc::now();
        let post = PostWithAttestations {
            post: Post {
                id: "p1".into(),
                title: "t".into(),
                content: "c".into(),
                media_url: "https://cdn/x.mp4".into(),
                author: WalletAddress::from(Address::repeat_byte(1)),
                collaborators: vec![],
                attesters: vec![],
                created_at: now,
                updated_at: now,
            },
            attestations: vec![],
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["mediaUrl"], "https://cdn/x.mp4");
        assert_eq!(json["id"], "p1");
        assert!(json["attestations"].as_array().unwrap().is_empty());
        assert!(json.get("post").is_none());
    }

    #[test]
    fn update_request_rejects_unknown_fields() {
        let ok: UpdatePostRequest = serde_json::from_str(r#"{"title":"new"}"#).unwrap();
        assert_eq!(ok.title.as_deref(), Some("new"));
        assert!(serde_json::from_str::<UpdatePostRequest>(r#"{"author":"0x00"}"#).is_err());
    }
}
