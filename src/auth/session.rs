// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed session tokens (HS256 JWT) issued after a successful SIWE sign-in.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::models::{User, WalletAddress};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Issuer claim stamped on every token.
const ISSUER: &str = "gm-report";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    /// Checksummed wallet address
    sub: String,
    username: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// The signed-in wallet behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub address: WalletAddress,
    pub username: String,
    /// Unix seconds
    pub expires_at: i64,
}

impl SessionUser {
    /// Require that `claimed` names the same wallet as this session.
    ///
    /// Comparison is on the parsed address, so casing does not matter.
    pub fn require_address(&self, claimed: &str) -> Result<WalletAddress, AuthError> {
        match WalletAddress::parse(claimed) {
            Some(addr) if addr == self.address => Ok(addr),
            _ => Err(AuthError::AddressMismatch),
        }
    }
}

/// Keys and lifetime for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for `user`. Returns the token and its expiry.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::InternalError(format!("session ttl: {e}")))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InternalError("session ttl out of range".to_string()))?;

        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("token encoding: {e}")))?;
        Ok((token, expires_at))
    }

    /// Verify a token and return the session it carries.
    pub fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[ISSUER]);
        validation.validate_aud = false;

        let token_data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        let claims = token_data.claims;
        let address = WalletAddress::parse(&claims.sub).ok_or(AuthError::MalformedToken)?;
        Ok(SessionUser {
            address,
            username: claims.username,
            expires_at: claims.exp,
        })
    }
}
