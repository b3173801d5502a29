// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-In with Ethereum (EIP-4361) messages.
//!
//! Clients send either the plain-text message they signed or the structured
//! object their SIWE library built it from. Both are turned into a
//! [`SiweMessage`]. Submitted text is signature-checked as sent; a structured
//! message is rendered with [`SiweMessage::to_message`] first.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// A parsed EIP-4361 message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiweMessage {
    /// Optional URI scheme in front of the domain (`https`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// `host[:port]` requesting the signature.
    pub domain: String,
    /// Signing address as it appears in the message.
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    /// RFC 3339 timestamps are kept verbatim so the message re-renders byte for byte.
    pub issued_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiweError {
    #[error("Invalid SIWE message: {0}")]
    Malformed(String),

    #[error("SIWE domain `{found}` does not match `{expected}`")]
    DomainMismatch { expected: String, found: String },

    #[error("Unsupported SIWE version `{0}`")]
    UnsupportedVersion(String),

    #[error("SIWE message has expired")]
    Expired,

    #[error("SIWE message is not yet valid")]
    NotYetValid,

    #[error("SIWE signature is invalid: {0}")]
    InvalidSignature(String),

    #[error("SIWE signature was not made by {0}")]
    SignerMismatch(String),
}

impl SiweError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SiweError::Malformed(_) => "invalid_siwe_message",
            SiweError::DomainMismatch { .. } => "siwe_domain_mismatch",
            SiweError::UnsupportedVersion(_) => "siwe_unsupported_version",
            SiweError::Expired => "siwe_expired",
            SiweError::NotYetValid => "siwe_not_yet_valid",
            SiweError::InvalidSignature(_) => "siwe_invalid_signature",
            SiweError::SignerMismatch(_) => "siwe_signer_mismatch",
        }
    }
}

fn malformed(reason: impl Into<String>) -> SiweError {
    SiweError::Malformed(reason.into())
}

fn parse_time(field: &str, raw: &str) -> Result<DateTime<Utc>, SiweError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(format!("{field}: {e}")))
}

impl SiweMessage {
    /// Parse the EIP-4361 text form.
    pub fn parse(text: &str) -> Result<Self, SiweError> {
        let text = text.replace("\r\n", "\n");
        let mut lines = text.split('\n').peekable();

        let header = lines.next().ok_or_else(|| malformed("empty message"))?;
        let origin = header
            .strip_suffix(HEADER_SUFFIX)
            .ok_or_else(|| malformed("missing header"))?;
        let (scheme, domain) = match origin.split_once("://") {
            Some((scheme, domain)) => (Some(scheme.to_string()), domain.to_string()),
            None => (None, origin.to_string()),
        };
        if domain.is_empty() {
            return Err(malformed("missing domain"));
        }

        let address = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| malformed("missing address"))?
            .to_string();

        while lines.peek().is_some_and(|l| l.is_empty()) {
            lines.next();
        }
        let statement = match lines.peek() {
            Some(line) if !line.starts_with("URI: ") => {
                let statement = line.to_string();
                lines.next();
                while lines.peek().is_some_and(|l| l.is_empty()) {
                    lines.next();
                }
                Some(statement)
            }
            _ => None,
        };

        let mut required = |tag: &str| -> Result<String, SiweError> {
            lines
                .next()
                .and_then(|l| l.strip_prefix(tag))
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("expected `{}`", tag.trim_end())))
        };
        let uri = required("URI: ")?;
        let version = required("Version: ")?;
        let chain_id = required("Chain ID: ")?
            .parse::<u64>()
            .map_err(|e| malformed(format!("Chain ID: {e}")))?;
        let nonce = required("Nonce: ")?;
        let issued_at = required("Issued At: ")?;

        let mut optional = |tag: &str| -> Option<String> {
            let value = lines.peek()?.strip_prefix(tag)?.to_string();
            lines.next();
            Some(value)
        };
        let expiration_time = optional("Expiration Time: ");
        let not_before = optional("Not Before: ");
        let request_id = optional("Request ID: ");

        let mut resources = Vec::new();
        if lines.peek() == Some(&"Resources:") {
            lines.next();
            while let Some(resource) = lines.peek().and_then(|l| l.strip_prefix("- ")) {
                resources.push(resource.to_string());
                lines.next();
            }
        }

        if lines.any(|l| !l.is_empty()) {
            return Err(malformed("unexpected trailing content"));
        }

        let message = SiweMessage {
            scheme,
            domain,
            address,
            statement,
            uri,
            version,
            chain_id,
            nonce,
            issued_at,
            expiration_time,
            not_before,
            request_id,
            resources,
        };
        message.validate_fields()?;
        Ok(message)
    }

    /// Field checks shared by both input forms.
    pub fn validate_fields(&self) -> Result<(), SiweError> {
        Address::from_str(&self.address).map_err(|e| malformed(format!("address: {e}")))?;
        if self.nonce.len() < 8 || !self.nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed("nonce must be at least 8 alphanumeric characters"));
        }
        if self.statement.as_deref().is_some_and(|s| s.contains('\n')) {
            return Err(malformed("statement must be a single line"));
        }
        parse_time("Issued At", &self.issued_at)?;
        if let Some(raw) = &self.expiration_time {
            parse_time("Expiration Time", raw)?;
        }
        if let Some(raw) = &self.not_before {
            parse_time("Not Before", raw)?;
        }
        Ok(())
    }

    /// Signing address.
    pub fn signer(&self) -> Result<Address, SiweError> {
        Address::from_str(&self.address).map_err(|e| malformed(format!("address: {e}")))
    }

    /// Render the EIP-4361 text that wallets sign.
    pub fn to_message(&self) -> String {
        let origin = match &self.scheme {
            Some(scheme) => format!("{scheme}://{}", self.domain),
            None => self.domain.clone(),
        };

        let mut out = format!("{origin}{HEADER_SUFFIX}\n{}\n\n", self.address);
        if let Some(statement) = &self.statement {
            out.push_str(statement);
            out.push('\n');
        }
        out.push('\n');

        out.push_str(&format!("URI: {}\n", self.uri));
        out.push_str(&format!("Version: {}\n", self.version));
        out.push_str(&format!("Chain ID: {}\n", self.chain_id));
        out.push_str(&format!("Nonce: {}\n", self.nonce));
        out.push_str(&format!("Issued At: {}", self.issued_at));
        if let Some(v) = &self.expiration_time {
            out.push_str(&format!("\nExpiration Time: {v}"));
        }
        if let Some(v) = &self.not_before {
            out.push_str(&format!("\nNot Before: {v}"));
        }
        if let Some(v) = &self.request_id {
            out.push_str(&format!("\nRequest ID: {v}"));
        }
        if !self.resources.is_empty() {
            out.push_str("\nResources:");
            for resource in &self.resources {
                out.push_str(&format!("\n- {resource}"));
            }
        }
        out
    }

    /// Check domain, version, time bounds and signature.
    ///
    /// `signed_text` is the exact text the wallet signed. Nonce freshness is
    /// checked by the caller against its nonce store.
    pub fn verify(
        &self,
        signed_text: &str,
        signature: &str,
        expected_domain: &str,
        now: DateTime<Utc>,
    ) -> Result<Address, SiweError> {
        if !self.domain.eq_ignore_ascii_case(expected_domain) {
            return Err(SiweError::DomainMismatch {
                expected: expected_domain.to_string(),
                found: self.domain.clone(),
            });
        }
        if self.version != "1" {
            return Err(SiweError::UnsupportedVersion(self.version.clone()));
        }
        if let Some(raw) = &self.expiration_time {
            if now >= parse_time("Expiration Time", raw)? {
                return Err(SiweError::Expired);
            }
        }
        if let Some(raw) = &self.not_before {
            if now < parse_time("Not Before", raw)? {
                return Err(SiweError::NotYetValid);
            }
        }

        let signature = Signature::from_str(signature.trim())
            .map_err(|e| SiweError::InvalidSignature(e.to_string()))?;
        let recovered = signature
            .recover_address_from_msg(signed_text.as_bytes())
            .map_err(|e| SiweError::InvalidSignature(e.to_string()))?;

        let claimed = self.signer()?;
        if recovered != claimed {
            return Err(SiweError::SignerMismatch(claimed.to_string()));
        }
        Ok(claimed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use chrono::Duration;

    pub(crate) fn message_for(signer: &PrivateKeySigner, domain: &str, nonce: &str) -> SiweMessage {
        SiweMessage {
            scheme: None,
            domain: domain.to_string(),
            address: signer.address().to_string(),
            statement: Some("Sign in to gm report".to_string()),
            uri: format!("http://{domain}"),
            version: "1".to_string(),
            chain_id: 10,
            nonce: nonce.to_string(),
            issued_at: "2026-01-01T00:00:00.000Z".to_string(),
            expiration_time: None,
            not_before: None,
            request_id: None,
            resources: vec![],
        }
    }

    pub(crate) fn sign(signer: &PrivateKeySigner, text: &str) -> String {
        let signature = signer.sign_message_sync(text.as_bytes()).unwrap();
        alloy::hex::encode_prefixed(signature.as_bytes())
    }

    #[test]
    fn renders_eip4361_layout() {
        let signer = PrivateKeySigner::random();
        let mut message = message_for(&signer, "localhost:3000", "abcdEFGH1234");
        message.resources = vec!["ipfs://a".into(), "https://b".into()];
        let text = message.to_message();

        let expected = format!(
            "localhost:3000 wants you to sign in with your Ethereum account:\n{}\n\n\
             Sign in to gm report\n\n\
             URI: http://localhost:3000\nVersion: 1\nChain ID: 10\nNonce: abcdEFGH1234\n\
             Issued At: 2026-01-01T00:00:00.000Z\nResources:\n- ipfs://a\n- https://b",
            signer.address()
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn parse_inverts_render() {
        let signer = PrivateKeySigner::random();
        let mut message = message_for(&signer, "example.com", "nonce12345");
        message.scheme = Some("https".into());
        message.expiration_time = Some("2026-02-01T00:00:00Z".into());
        message.request_id = Some("req-1".into());
        assert_eq!(SiweMessage::parse(&message.to_message()).unwrap(), message);

        message.statement = None;
        let text = message.to_message();
        assert!(text.contains("\n\n\nURI: "));
        assert_eq!(SiweMessage::parse(&text).unwrap(), message);
    }

    #[test]
    fn parse_accepts_structured_json() {
        let json = r#"{
            "domain": "localhost:3000",
            "address": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
            "statement": "Sign in with Ethereum to the app.",
            "uri": "http://localhost:3000",
            "version": "1",
            "chainId": 10,
            "nonce": "k3j4h5g6f7d8",
            "issuedAt": "2026-01-01T00:00:00.000Z"
        }"#;
        let message: SiweMessage = serde_json::from_str(json).unwrap();
        message.validate_fields().unwrap();
        assert_eq!(message.chain_id, 10);
        assert!(message.resources.is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            SiweMessage::parse("hello"),
            Err(SiweError::Malformed(_))
        ));
        let signer = PrivateKeySigner::random();
        let text = message_for(&signer, "a.com", "short").to_message();
        assert!(matches!(SiweMessage::parse(&text), Err(SiweError::Malformed(_))));
    }

    #[test]
    fn verify_accepts_valid_signature() {
        let signer = PrivateKeySigner::random();
        let message = message_for(&signer, "localhost:3000", "abcdefgh1234");
        let text = message.to_message();
        let signature = sign(&signer, &text);

        let address = message
            .verify(&text, &signature, "localhost:3000", Utc::now())
            .unwrap();
        assert_eq!(address, signer.address());
    }

    #[test]
    fn verify_rejects_wrong_domain() {
        let signer = PrivateKeySigner::random();
        let message = message_for(&signer, "evil.example", "abcdefgh1234");
        let text = message.to_message();
        let signature = sign(&signer, &text);

        assert!(matches!(
            message.verify(&text, &signature, "localhost:3000", Utc::now()),
            Err(SiweError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn verify_rejects_expired_and_early_messages() {
        let signer = PrivateKeySigner::random();
        let now = Utc::now();

        let mut message = message_for(&signer, "localhost:3000", "abcdefgh1234");
        message.expiration_time = Some((now - Duration::minutes(1)).to_rfc3339());
        let text = message.to_message();
        let signature = sign(&signer, &text);
        assert_eq!(
            message.verify(&text, &signature, "localhost:3000", now),
            Err(SiweError::Expired)
        );

        let mut message = message_for(&signer, "localhost:3000", "abcdefgh1234");
        message.not_before = Some((now + Duration::minutes(5)).to_rfc3339());
        let text = message.to_message();
        let signature = sign(&signer, &text);
        assert_eq!(
            message.verify(&text, &signature, "localhost:3000", now),
            Err(SiweError::NotYetValid)
        );
    }

    #[test]
    fn verify_rejects_signature_from_another_key() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let message = message_for(&signer, "localhost:3000", "abcdefgh1234");
        let text = message.to_message();
        let signature = sign(&other, &text);

        assert!(matches!(
            message.verify(&text, &signature, "localhost:3000", Utc::now()),
            Err(SiweError::SignerMismatch(_))
        ));
    }

    #[test]
    fn verify_rejects_unparseable_signature() {
        let signer = PrivateKeySigner::random();
        let message = message_for(&signer, "localhost:3000", "abcdefgh1234");
        let text = message.to_message();
        assert!(matches!(
            message.verify(&text, "0x1234", "localhost:3000", Utc::now()),
            Err(SiweError::InvalidSignature(_))
        ));
    }
}
