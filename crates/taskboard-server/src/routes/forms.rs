//! Multipart form decoding for the project and task mutation endpoints.
//!
//! The frontend submits these as `multipart/form-data` because an image
//! may ride along with the text fields. Everything is collected into a
//! flat field map plus at most one uploaded file; the per-entity input
//! builders then validate from there.

use std::collections::HashMap;

use axum::extract::multipart::Multipart;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use taskboard_service::UploadedFile;

/// File field name the clients use for entity images.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default)]
pub(crate) struct FormPayload {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
    /// Explicit removal request, distinct from simply not sending a file.
    pub remove_image: bool,
}

impl FormPayload {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Drain a multipart stream into a [`FormPayload`]. A file part with an
/// empty body counts as "no file": browsers send one when the picker was
/// left untouched.
pub(crate) async fn read_form(
    mut multipart: Multipart,
) -> Result<FormPayload, (StatusCode, Json<Value>)> {
    let mut payload = FormPayload::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            // file_name() borrows the field; capture it before bytes()
            // consumes it.
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            if !bytes.is_empty() {
                payload.file = Some(UploadedFile { filename, bytes });
            }
        } else if name == "remove_image" {
            let value = field.text().await.map_err(bad_multipart)?;
            payload.remove_image = matches!(value.as_str(), "true" | "1" | "on");
        } else {
            let value = field.text().await.map_err(bad_multipart)?;
            payload.fields.insert(name, value);
        }
    }

    Ok(payload)
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("malformed multipart body: {e}") })),
    )
}
