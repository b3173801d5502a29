// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use alloy::primitives::B256;
use axum::{extract::State, Json};
use chrono::Utc;

use super::validation::{require, require_text, JsonBody};
use crate::{
    auth::OptionalSession,
    blockchain::AttestationClaim,
    error::{ApiError, ErrorBody},
    models::{
        Attestation, AttestationListResponse, CreateAttestationRequest,
        CreatedAttestationResponse, WalletAddress,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/attestations",
    tag = "Attestations",
    responses(
        (status = 200, body = AttestationListResponse),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn list_attestations(
    State(state): State<AppState>,
) -> Result<Json<AttestationListResponse>, ApiError> {
    let attestations = state.db.list_attestations()?;
    Ok(Json(AttestationListResponse {
        attestations,
        success: true,
    }))
}

/// Record an attestation the caller already submitted on-chain.
///
/// When an EAS network is configured the attestation is confirmed on-chain
/// first; otherwise it is recorded as submitted.
#[utoipa::path(
    post,
    path = "/api/attestations",
    request_body = CreateAttestationRequest,
    tag = "Attestations",
    security(("bearer" = [])),
    responses(
        (status = 200, body = CreatedAttestationResponse),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody),
        (status = 502, body = ErrorBody)
    )
)]
pub async fn create_attestation(
    State(state): State<AppState>,
    session: OptionalSession,
    JsonBody(request): JsonBody<CreateAttestationRequest>,
) -> Result<Json<CreatedAttestationResponse>, ApiError> {
    let tx_id = require_text(request.tx_id)?;
    let chain = require_text(request.chain)?;
    let schema_id = require_text(request.schema_id)?;
    let attester = require_text(request.attester)?;
    let recipient = require_text(request.recipient)?;
    let emotion = require(request.emotion)?;
    let impact = require(request.impact)?;
    let attester_role = require_text(request.attester_role)?;
    let category = require_text(request.category)?;
    let post_id = require_text(request.post_id)?;
    let connected_address = require_text(request.connected_address)?;
    let attestation_id = request
        .attestation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| tx_id.clone());

    if !(1..=5).contains(&impact) {
        return Err(ApiError::bad_request("impact must be between 1 and 5"));
    }

    let session = session.require()?;
    session.require_address(&connected_address)?;

    let attester = WalletAddress::parse(&attester)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid attester address: {attester}")))?;
    let recipient = WalletAddress::parse(&recipient)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid recipient address: {recipient}")))?;

    if let Some(eas) = &state.eas {
        let claim = AttestationClaim {
            uid: parse_bytes32("attestationId", &attestation_id)?,
            schema: parse_bytes32("schemaId", &schema_id)?,
            attester: attester.to_address().ok_or_else(|| ApiError::internal("Something went wrong"))?,
            recipient: recipient.to_address().ok_or_else(|| ApiError::internal("Something went wrong"))?,
        };
        eas.confirm(&chain, &claim).await?;
    }

    let attestation = Attestation {
        id: attestation_id,
        tx_id,
        chain,
        schema_id,
        attester,
        recipient,
        emotion,
        impact,
        attester_role,
        category,
        post_id,
        created_at: Utc::now(),
    };
    let updated_post = state.db.create_attestation(&attestation)?;
    tracing::info!(
        attestation_id = %attestation.id,
        post_id = %attestation.post_id,
        attester = %attestation.attester,
        "Attestation recorded"
    );

    Ok(Json(CreatedAttestationResponse {
        updated_post,
        message: "Attestation was created successfully".to_string(),
        success: true,
    }))
}

fn parse_bytes32(field: &str, raw: &str) -> Result<B256, ApiError> {
    B256::from_str(raw.trim())
        .map_err(|_| ApiError::bad_request(format!("{field} must be a 32-byte hex string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionUser;
    use crate::models::{Emotion, NewPost};
    use crate::state::test_state;
    use alloy::primitives::Address;
    use axum::http::StatusCode;

    fn session_for(byte: u8) -> OptionalSession {
        OptionalSession(Some(SessionUser {
            address: WalletAddress::from(Address::repeat_byte(byte)),
            username: "violetOwlSleek".into(),
            expires_at: i64::MAX,
        }))
    }

    fn seed_post(state: &AppState) -> String {
        state
            .db
            .create_post(NewPost {
                title: "gm".into(),
                content: "story".into(),
                media_url: "http://localhost:8080/media/a.mp4".into(),
                author: WalletAddress::from(Address::repeat_byte(1)),
            })
            .unwrap()
            .id
    }

    fn request(post_id: &str, attester: u8, uid: &str) -> CreateAttestationRequest {
        let attester = WalletAddress::from(Address::repeat_byte(attester)).to_string();
        CreateAttestationRequest {
            attestation_id: Some(uid.to_string()),
            tx_id: Some(format!("0x{}", "ab".repeat(32))),
            chain: Some("OPTIMISM_MAINNET".into()),
            schema_id: Some(format!("0x{}", "cd".repeat(32))),
            attester: Some(attester.clone()),
            recipient: Some(WalletAddress::from(Address::repeat_byte(1)).to_string()),
            emotion: Some(Emotion::Learning),
            impact: Some(5),
            attester_role: Some("audience".into()),
            category: Some("IMPACT_REPORT".into()),
            post_id: Some(post_id.to_string()),
            connected_address: Some(attester),
        }
    }

    #[tokio::test]
    async fn creates_attestation_and_appends_attester() {
        let (state, _dir) = test_state();
        let post_id = seed_post(&state);

        let Json(response) = create_attestation(
            State(state.clone()),
            session_for(2),
            JsonBody(request(&post_id, 2, "0x01")),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert_eq!(response.message, "Attestation was created successfully");
        assert_eq!(
            response.updated_post.post.attesters,
            vec![WalletAddress::from(Address::repeat_byte(2))]
        );
        assert_eq!(response.updated_post.attestations[0].id, "0x01");

        let Json(list) = list_attestations(State(state)).await.unwrap();
        assert_eq!(list.attestations.len(), 1);
        assert_eq!(list.attestations[0].post.id, post_id);
    }

    #[tokio::test]
    async fn duplicate_attestation_is_conflict() {
        let (state, _dir) = test_state();
        let post_id = seed_post(&state);
        create_attestation(State(state.clone()), session_for(2), JsonBody(request(&post_id, 2, "0x01")))
            .await
            .unwrap();

        let err = create_attestation(State(state), session_for(2), JsonBody(request(&post_id, 2, "0x01")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_session_is_forbidden() {
        let (state, _dir) = test_state();
        let post_id = seed_post(&state);
        let err = create_attestation(State(state), OptionalSession(None), JsonBody(request(&post_id, 2, "0x01")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Not authenticated, please login");
        assert_eq!(err.code, Some("not_authenticated"));
    }

    #[tokio::test]
    async fn mismatched_connected_address_is_forbidden() {
        let (state, _dir) = test_state();
        let post_id = seed_post(&state);
        let err = create_attestation(State(state.clone()), session_for(3), JsonBody(request(&post_id, 2, "0x01")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(state.db.list_attestations().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_field_is_bad_request_before_auth() {
        let (state, _dir) = test_state();
        let mut body = request("p", 2, "0x01");
        body.category = None;
        let err = create_attestation(State(state), OptionalSession(None), JsonBody(body))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Missing variables in request");
    }

    #[tokio::test]
    async fn impact_out_of_range_is_bad_request() {
        let (state, _dir) = test_state();
        let post_id = seed_post(&state);
        let mut body = request(&post_id, 2, "0x01");
        body.impact = Some(6);
        let err = create_attestation(State(state), session_for(2), JsonBody(body))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_post_is_not_found() {
        let (state, _dir) = test_state();
        let err = create_attestation(State(state), session_for(2), JsonBody(request("ghost", 2, "0x01")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn attestation_id_defaults_to_tx_id() {
        let (state, _dir) = test_state();
        let post_id = seed_post(&state);
        let mut body = request(&post_id, 2, "unused");
        body.attestation_id = None;
        let tx_id = body.tx_id.clone().unwrap();

        let Json(response) = create_attestation(State(state), session_for(2), JsonBody(body))
            .await
            .unwrap();
        assert_eq!(response.updated_post.attestations[0].id, tx_id);
    }
}
