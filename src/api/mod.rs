// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    models::{
        Attestation, AttestationListResponse, AttestationWithPost, CreateAttestationRequest,
        CreatedAttestationResponse, CreatedGmPostResponse, CreatedPostResponse, Emotion, GmPost,
        GmPostListResponse, Post, PostListResponse, PostResponse, PostWithAttestations,
        UpdatePostRequest, UpdatedPostResponse, User, WalletAddress,
    },
    state::AppState,
    storage::MediaStore,
};

pub mod attestations;
pub mod auth;
pub mod health;
pub mod posts;
pub mod upload;
pub mod validation;

/// Build the HTTP application.
///
/// `max_upload_bytes` caps request bodies, which bounds multipart video uploads.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/{id}", get(posts::get_post).patch(posts::update_post))
        .route(
            "/attestations",
            get(attestations::list_attestations).post(attestations::create_attestation),
        )
        .route(
            "/upload-video",
            get(upload::list_uploads).post(upload::upload_video),
        )
        .route("/auth/nonce", get(auth::nonce))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/session", get(auth::session));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let mut app = Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state.clone());

    if let MediaStore::Local { dir, .. } = state.media.as_ref() {
        app = app.nest_service("/media", ServeDir::new(dir));
    }

    let request_tracing = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    app.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(request_tracing)
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "gm report API",
        description = "Video posts, Sign-In with Ethereum sessions and EAS impact attestations"
    ),
    paths(
        posts::list_posts,
        posts::create_post,
        posts::get_post,
        posts::update_post,
        attestations::list_attestations,
        attestations::create_attestation,
        upload::upload_video,
        upload::list_uploads,
        auth::nonce,
        auth::verify,
        auth::session,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Post,
            PostWithAttestations,
            Attestation,
            AttestationWithPost,
            Emotion,
            User,
            GmPost,
            WalletAddress,
            UpdatePostRequest,
            CreateAttestationRequest,
            PostListResponse,
            PostResponse,
            UpdatedPostResponse,
            CreatedPostResponse,
            AttestationListResponse,
            CreatedAttestationResponse,
            CreatedGmPostResponse,
            GmPostListResponse,
            posts::CreatePostForm,
            upload::UploadVideoForm,
            auth::NonceResponse,
            auth::SiweInput,
            auth::VerifyRequest,
            auth::VerifyResponse,
            auth::SessionResponse,
            crate::auth::SiweMessage,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Posts", description = "Video posts"),
        (name = "Attestations", description = "Impact attestations on posts"),
        (name = "Uploads", description = "Unauthenticated gm video uploads"),
        (name = "Auth", description = "Sign-In with Ethereum"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
