// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Video object storage.
//!
//! Uploaded files are stored under `<uuid><ext>` either in a Supabase storage
//! bucket or in a local directory that the service itself serves at `/media`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use uuid::Uuid;

use crate::config::MediaBackendConfig;

/// Uploads can be large; allow them time to complete.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage backend rejected the upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("uploaded file is empty")]
    Empty,
}

/// Where uploads are written.
#[derive(Debug, Clone)]
pub enum MediaStore {
    Local {
        dir: PathBuf,
        public_base_url: String,
    },
    Supabase {
        client: reqwest::Client,
        api_url: String,
        service_key: String,
        bucket: String,
    },
}

impl MediaStore {
    /// Build the store described by the configuration.
    pub fn from_config(config: &MediaBackendConfig, media_dir: &Path) -> Result<Self, MediaError> {
        match config {
            MediaBackendConfig::Local { public_base_url } => Ok(MediaStore::Local {
                dir: media_dir.to_path_buf(),
                public_base_url: public_base_url.clone(),
            }),
            MediaBackendConfig::Supabase {
                api_url,
                service_key,
                bucket,
            } => Ok(MediaStore::Supabase {
                client: reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?,
                api_url: api_url.clone(),
                service_key: service_key.clone(),
                bucket: bucket.clone(),
            }),
        }
    }

    /// Short name for logs and health output.
    pub fn backend_name(&self) -> &'static str {
        match self {
            MediaStore::Local { .. } => "local",
            MediaStore::Supabase { .. } => "supabase",
        }
    }

    /// Store `data` and return its public URL.
    pub async fn upload(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, MediaError> {
        if data.is_empty() {
            return Err(MediaError::Empty);
        }
        let object_name = object_name(file_name);
        let size = data.len();

        let url = match self {
            MediaStore::Local {
                dir,
                public_base_url,
            } => {
                tokio::fs::create_dir_all(dir).await?;
                tokio::fs::write(dir.join(&object_name), &data).await?;
                format!("{public_base_url}/media/{object_name}")
            }
            MediaStore::Supabase {
                client,
                api_url,
                service_key,
                bucket,
            } => {
                let endpoint = format!("{api_url}/storage/v1/object/{bucket}/{object_name}");
                let response = client
                    .post(&endpoint)
                    .header(AUTHORIZATION, format!("Bearer {service_key}"))
                    .header("apikey", service_key.as_str())
                    .header(CONTENT_TYPE, content_type.unwrap_or("application/octet-stream"))
                    .header("x-upsert", "false")
                    .body(data)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(MediaError::Rejected {
                        status: status.as_u16(),
                        body,
                    });
                }
                format!("{api_url}/storage/v1/object/public/{bucket}/{object_name}")
            }
        };

        tracing::info!(
            backend = self.backend_name(),
            object = %object_name,
            bytes = size,
            "Stored uploaded video"
        );
        Ok(url)
    }

    /// Readiness check for the backend.
    pub async fn health_check(&self) -> Result<(), MediaError> {
        match self {
            MediaStore::Local { dir, .. } => {
                tokio::fs::create_dir_all(dir).await?;
                Ok(())
            }
            MediaStore::Supabase {
                client,
                api_url,
                service_key,
                bucket,
            } => {
                let response = client
                    .get(format!("{api_url}/storage/v1/bucket/{bucket}"))
                    .header(AUTHORIZATION, format!("Bearer {service_key}"))
                    .header("apikey", service_key.as_str())
                    .timeout(Duration::from_secs(5))
                    .send()
                    .await?;
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(MediaError::Rejected {
                        status: status.as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    })
                }
            }
        }
    }
}

/// `<uuid><ext>`, keeping the original extension when it is plain alphanumeric.
fn object_name(file_name: Option<&str>) -> String {
    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    }
}
