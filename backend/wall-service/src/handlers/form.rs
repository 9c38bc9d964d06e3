/// Multipart composer form parsing shared by the page and API handlers
use crate::components::{Composer, ComposerError};
use crate::error::{AppError, Result};
use crate::models::MediaFile;
use crate::services::media::MAX_FILE_SIZE;
use actix_multipart::Multipart;
use bytes::BytesMut;
use futures_util::stream::StreamExt;

pub const BODY_FIELD: &str = "body";
pub const UPLOADER_NAME_FIELD: &str = "uploader_name";
pub const FILE_FIELD: &str = "file";

/// Text fields are small; anything larger is not a composer submission
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct ComposerForm {
    pub body: String,
    pub uploader_name: String,
    pub file: Option<MediaFile>,
}

impl ComposerForm {
    /// Copy the submitted draft into `composer`, attaching the file last so a
    /// rejected file still leaves the text in place
    pub fn apply_to(self, composer: &mut Composer) -> std::result::Result<(), ComposerError> {
        composer.set_body(self.body);
        composer.set_uploader_name(self.uploader_name);
        match self.file {
            Some(file) => composer.select_file(file),
            None => Ok(()),
        }
    }
}

/// Read a composer form. File bytes beyond the size limit are drained and
/// dropped; the kept prefix is still over the limit so validation rejects it.
pub async fn read_composer_form(mut payload: Multipart) -> Result<ComposerForm> {
    let mut form = ComposerForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;

        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let limit = if name == FILE_FIELD {
            MAX_FILE_SIZE + 1
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut buffer = BytesMut::new();
        let mut truncated = false;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::error!("Error reading form field {}: {}", name, e);
                AppError::BadRequest(format!("Invalid multipart body: {}", e))
            })?;
            let room = limit.saturating_sub(buffer.len());
            if chunk.len() > room {
                truncated = true;
            }
            buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }

        match name.as_str() {
            BODY_FIELD | UPLOADER_NAME_FIELD => {
                if truncated {
                    return Err(AppError::BadRequest(format!("Field {} is too large", name)));
                }
                let text = String::from_utf8(buffer.to_vec()).map_err(|_| {
                    AppError::BadRequest(format!("Field {} is not valid UTF-8", name))
                })?;
                if name == BODY_FIELD {
                    form.body = text;
                } else {
                    form.uploader_name = text;
                }
            }
            FILE_FIELD => {
                let filename = filename.unwrap_or_default();
                // Browsers send an empty part when no file was chosen
                if filename.is_empty() && buffer.is_empty() {
                    continue;
                }
                if truncated {
                    tracing::debug!(filename = %filename, "oversized upload truncated while reading");
                }
                form.file = Some(MediaFile::new(filename, content_type, buffer.freeze()));
            }
            other => {
                tracing::debug!(field = %other, "ignoring unknown form field");
            }
        }
    }

    Ok(form)
}
