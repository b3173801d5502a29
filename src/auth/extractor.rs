// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the signed-in wallet.
//!
//! ```rust,ignore
//! async fn my_handler(Session(user): Session) -> impl IntoResponse {
//!     // user is SessionUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, SessionUser};
use crate::state::AppState;

/// Extractor for a verified session.
///
/// Reads `Authorization: Bearer <token>` and verifies it with the service's
/// session keys. A missing header is `NotAuthenticated` (403).
pub struct Session(pub SessionUser);

impl FromRequestParts<AppState> for Session {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::NotAuthenticated)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = state.sessions.verify(token.trim())?;
        Ok(Session(user))
    }
}

/// Optional session extractor.
///
/// Returns `None` if no valid session is present, instead of rejecting. Used by
/// handlers that validate the request body before checking who is calling.
pub struct OptionalSession(pub Option<SessionUser>);

impl OptionalSession {
    /// The session, or `NotAuthenticated`.
    pub fn require(self) -> Result<SessionUser, AuthError> {
        self.0.ok_or(AuthError::NotAuthenticated)
    }
}

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Session::from_request_parts(parts, state).await {
            Ok(Session(user)) => Ok(OptionalSession(Some(user))),
            Err(e) => {
                if !matches!(e, AuthError::NotAuthenticated) {
                    tracing::debug!(error = %e, "Ignoring invalid session");
                }
                Ok(OptionalSession(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, WalletAddress};
    use crate::state::test_state;
    use alloy::primitives::Address;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/posts");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn valid_bearer_token_yields_session() {
        let (state, _dir) = test_state();
        let user = User {
            id: WalletAddress::from(Address::repeat_byte(7)),
            username: "tealFoxTidy".into(),
            created_at: chrono::Utc::now(),
        };
        let (token, _) = state.sessions.issue(&user).unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let Session(session) = Session::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.address, user.id);
    }

    #[tokio::test]
    async fn missing_header_is_not_authenticated() {
        let (state, _dir) = test_state();
        let mut parts = parts_with(None);
        let result = Session::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn wrong_scheme_is_invalid_header() {
        let (state, _dir) = test_state();
        let mut parts = parts_with(Some("Basic abc"));
        let result = Session::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn optional_session_swallows_bad_tokens() {
        let (state, _dir) = test_state();
        let mut parts = parts_with(Some("Bearer garbage"));
        let OptionalSession(session) = OptionalSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(session.is_none());
    }
}
