// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use super::validation::{JsonBody, MultipartForm, MISSING_VARIABLES};
use crate::{
    auth::OptionalSession,
    error::{ApiError, ErrorBody},
    models::{
        CreatedPostResponse, NewPost, PostListResponse, PostPatch, PostResponse,
        UpdatePostRequest, UpdatedPostResponse, WalletAddress,
    },
    state::AppState,
};

/// Multipart body of `POST /api/posts` (documentation only).
#[derive(serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct CreatePostForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    title: String,
    description: String,
    connected_address: String,
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    responses(
        (status = 200, body = PostListResponse),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<PostListResponse>, ApiError> {
    let posts = state.db.list_posts()?;
    Ok(Json(PostListResponse {
        posts,
        success: true,
    }))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    request_body(content = CreatePostForm, content_type = "multipart/form-data"),
    security(("bearer" = [])),
    responses(
        (status = 200, body = CreatedPostResponse),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 502, body = ErrorBody)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    session: OptionalSession,
    multipart: Multipart,
) -> Result<Json<CreatedPostResponse>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.file()?;
    let title = form.text("title")?;
    let description = form.text("description")?;
    let connected_address = form.text("connectedAddress")?;

    let session = session.require()?;
    let author = session.require_address(&connected_address)?;

    let media_url = state
        .media
        .upload(
            file.file_name.as_deref(),
            file.content_type.as_deref(),
            file.data,
        )
        .await?;

    let post = state.db.create_post(NewPost {
        title,
        content: description,
        media_url,
        author,
    })?;
    tracing::info!(post_id = %post.id, author = %post.author, "Post created");

    Ok(Json(CreatedPostResponse {
        post,
        message: "Post was created successfully".to_string(),
        success: true,
    }))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post UUID")),
    tag = "Posts",
    responses(
        (status = 200, body = PostResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_post(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.db.get_post(&id)?;
    Ok(Json(PostResponse {
        post,
        success: true,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post UUID")),
    request_body = UpdatePostRequest,
    tag = "Posts",
    responses(
        (status = 200, body = UpdatedPostResponse),
        (status = 400, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_post(
    Path(id): Path<String>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdatePostRequest>,
) -> Result<Json<UpdatedPostResponse>, ApiError> {
    let patch = to_patch(request)?;
    let post = state.db.update_post(&id, patch)?;
    Ok(Json(UpdatedPostResponse {
        post,
        success: true,
    }))
}

fn to_patch(request: UpdatePostRequest) -> Result<PostPatch, ApiError> {
    let non_blank = |v: Option<String>| -> Result<Option<String>, ApiError> {
        match v {
            Some(s) if s.trim().is_empty() => Err(ApiError::bad_request(MISSING_VARIABLES)),
            other => Ok(other),
        }
    };

    let collaborators = request
        .collaborators
        .unwrap_or_default()
        .iter()
        .map(|raw| {
            WalletAddress::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("Invalid collaborator address: {raw}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PostPatch {
        title: non_blank(request.title)?,
        content: non_blank(request.content)?,
        media_url: non_blank(request.media_url)?,
        collaborators,
    })
}
