// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request parsing and required-field checks shared by the handlers.

use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart, extract::FromRequest};

use crate::error::ApiError;

/// Message for any absent or blank required field.
pub const MISSING_VARIABLES: &str = "Missing variables in request";

/// JSON body extractor whose rejections render as `{ error, success: false }`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Unwrap a required value.
pub fn require<T>(value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(MISSING_VARIABLES))
}

/// Unwrap a required string, rejecting blank values.
pub fn require_text(value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(MISSING_VARIABLES)),
    }
}

/// A file part of a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A fully buffered multipart form: text fields plus the `file` part.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Drain `multipart`. The part named `file` is kept as bytes; other parts as text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "file" {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Required non-blank text field.
    pub fn text(&mut self, name: &str) -> Result<String, ApiError> {
        require_text(self.fields.remove(name))
    }

    /// Required non-empty file.
    pub fn file(&mut self) -> Result<UploadedFile, ApiError> {
        match self.file.take() {
            Some(file) if !file.data.is_empty() => Ok(file),
            _ => Err(ApiError::bad_request(MISSING_VARIABLES)),
        }
    }
}
