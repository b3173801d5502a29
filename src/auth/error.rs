// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::siwe::SiweError;
use crate::error::ApiError;

/// Authentication error type.
///
/// A missing session and a session for a different wallet both answer 403,
/// which is what the web client expects. Problems with a presented token or
/// SIWE message answer 401.
#[derive(Debug)]
pub enum AuthError {
    /// No session was presented
    NotAuthenticated,
    /// Session address differs from the address the client claims
    AddressMismatch,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Nonce was never issued, already used, or expired
    InvalidNonce,
    /// SIWE message failed to parse or verify
    Siwe(SiweError),
    /// Internal error
    InternalError(String),
}


impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::AddressMismatch => "address_mismatch",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidNonce => "invalid_nonce",
            AuthError::Siwe(e) => e.error_code(),
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotAuthenticated | AuthError::AddressMismatch => StatusCode::FORBIDDEN,
            AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidNonce
            | AuthError::Siwe(_) => StatusCode::UNAUTHORIZED,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NotAuthenticated => write!(f, "Not authenticated, please login"),
            AuthError::AddressMismatch => write!(
                f,
                "Connected address is not authorized, please reauthenticate (logout, then login again)"
            ),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Session token is malformed"),
            AuthError::InvalidSignature => write!(f, "Session token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Session has expired, please login again"),
            AuthError::InvalidNonce => write!(f, "Nonce is invalid or has expired"),
            AuthError::Siwe(e) => write!(f, "{e}"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<SiweError> for AuthError {
    fn from(e: SiweError) -> Self {
        AuthError::Siwe(e)
    }
}

impl From<crate::storage::DbError> for AuthError {
    fn from(e: crate::storage::DbError) -> Self {
        tracing::error!(error = %e, "Database operation failed during sign-in");
        AuthError::InternalError("database unavailable".to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::new(e.status_code(), e.to_string()).with_code(e.error_code())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
