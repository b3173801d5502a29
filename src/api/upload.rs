// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unauthenticated video uploads ("gm posts").

use axum::{
    extract::{Multipart, State},
    Json,
};

use super::validation::MultipartForm;
use crate::{
    error::{ApiError, ErrorBody},
    models::{CreatedGmPostResponse, GmPostListResponse},
    state::AppState,
};

/// Multipart body of `POST /api/upload-video` (documentation only).
#[derive(serde::Deserialize, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadVideoForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    title: String,
    description: String,
}

#[utoipa::path(
    post,
    path = "/api/upload-video",
    tag = "Uploads",
    request_body(content = UploadVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = CreatedGmPostResponse),
        (status = 400, body = ErrorBody),
        (status = 413, body = ErrorBody),
        (status = 502, body = ErrorBody)
    )
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CreatedGmPostResponse>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.file()?;
    let title = form.text("title")?;
    let description = form.text("description")?;

    let media_url = state
        .media
        .upload(
            file.file_name.as_deref(),
            file.content_type.as_deref(),
            file.data,
        )
        .await?;
    let post = state.db.create_gm_post(title, description, media_url)?;
    tracing::info!(gm_post_id = %post.id, "Gm post created");

    Ok(Json(CreatedGmPostResponse {
        post,
        message: "Post was created successfully".to_string(),
        success: true,
    }))
}

#[utoipa::path(
    get,
    path = "/api/upload-video",
    tag = "Uploads",
    responses((status = 200, body = GmPostListResponse))
)]
pub async fn list_uploads(
    State(state): State<AppState>,
) -> Result<Json<GmPostListResponse>, ApiError> {
    let posts = state.db.list_gm_posts()?;
    Ok(Json(GmPostListResponse {
        posts,
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GmPost;
    use crate::state::test_state;
    use chrono::{Duration, Utc};

    fn seed(state: &AppState, title: &str, minutes_ago: i64) {
        state
            .db
            .insert_gm_post(&GmPost {
                id: format!("gm-{title}"),
                title: title.to_string(),
                content: "gm".into(),
                media_url: format!("http://localhost:8080/media/{title}.mp4"),
                created_at: Utc::now() - Duration::minutes(minutes_ago),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn list_uploads_newest_first() {
        let (state, _dir) = test_state();
        seed(&state, "older", 10);
        seed(&state, "newer", 1);
        seed(&state, "oldest", 60);

        let Json(response) = list_uploads(State(state)).await.unwrap();
        assert!(response.success);
        let titles: Vec<&str> = response.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older", "oldest"]);
    }
}
