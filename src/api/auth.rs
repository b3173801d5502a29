// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-In with Ethereum endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::JsonBody;
use crate::{
    auth::{generate_username, AuthError, Session, SiweMessage},
    error::ErrorBody,
    models::{User, WalletAddress},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NonceResponse {
    pub nonce: String,
    pub success: bool,
}

/// The signed message, as text or as the object it was built from.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SiweInput {
    Text(String),
    Structured(SiweMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub message: SiweInput,
    /// 65-byte hex signature.
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Bearer token for later requests.
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub address: WalletAddress,
    pub username: String,
    pub expires_at: DateTime<Utc>,
    pub success: bool,
}

#[utoipa::path(
    get,
    path = "/api/auth/nonce",
    tag = "Auth",
    responses((status = 200, body = NonceResponse))
)]
pub async fn nonce(State(state): State<AppState>) -> Json<NonceResponse> {
    Json(NonceResponse {
        nonce: state.nonces.issue(),
        success: true,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, body = VerifyResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AuthError> {
    let (message, signed_text) = match request.message {
        SiweInput::Text(text) => (SiweMessage::parse(&text)?, text),
        SiweInput::Structured(message) => {
            message.validate_fields()?;
            let text = message.to_message();
            (message, text)
        }
    };

    let signer = message.verify(
        &signed_text,
        &request.signature,
        &state.siwe_domain,
        Utc::now(),
    )?;

    // Consumed only after the signature checks out, so a forged attempt
    // cannot burn someone else's nonce.
    if !state.nonces.consume(&message.nonce) {
        return Err(AuthError::InvalidNonce);
    }

    let address = WalletAddress::from(signer);
    let (user, created) = state.db.get_or_create_user(&address, generate_username)?;
    if created {
        tracing::info!(address = %user.id, username = %user.username, "New user signed in");
    }

    let (token, expires_at) = state.sessions.issue(&user)?;
    Ok(Json(VerifyResponse {
        token,
        user,
        expires_at,
        success: true,
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SessionResponse),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn session(Session(user): Session) -> Result<Json<SessionResponse>, AuthError> {
    let expires_at = Utc
        .timestamp_opt(user.expires_at, 0)
        .single()
        .ok_or(AuthError::MalformedToken)?;
    Ok(Json(SessionResponse {
        address: user.address,
        username: user.username,
        expires_at,
        success: true,
    }))
}
