use std::path::Path;

use axum::extract::Multipart;

use crate::api::errors::ApiError;
use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::services::storage::StorageService;

pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

impl UploadedFile {
    pub(crate) fn extension(&self) -> String {
        file_extension(&self.filename).unwrap_or_else(|| "bin".to_string())
    }
}

#[derive(Default)]
pub(crate) struct MultipartForm {
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) file: Option<UploadedFile>,
}

pub(crate) async fn read_multipart(
    mut multipart: Multipart,
    file_field: &str,
    settings: &Settings,
) -> Result<MultipartForm, ApiError> {
    let max_upload_size_mb = settings.storage().max_upload_size_mb;
    let max_bytes = max_upload_size_mb * 1024 * 1024;
    let mut form = MultipartForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == file_field && field.file_name().is_some() {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type =
                field.content_type().unwrap_or("application/octet-stream").to_string();
            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
            {
                if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File size exceeds {max_upload_size_mb}MB limit"
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            if !bytes.is_empty() {
                form.file = Some(UploadedFile { filename, content_type, bytes });
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|_| ApiError::BadRequest(format!("Invalid value for '{name}'")))?;
            form.fields.push((name, text));
        }
    }

    Ok(form)
}

pub(crate) fn require_image(
    file: Option<UploadedFile>,
    settings: &Settings,
) -> Result<UploadedFile, ApiError> {
    let file = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    validate_image_upload(
        &file.filename,
        &file.content_type,
        &settings.storage().allowed_image_extensions,
    )?;
    Ok(file)
}

pub(crate) fn require_storage(state: &AppState) -> Result<&StorageService, ApiError> {
    state
        .storage()
        .ok_or_else(|| ApiError::ServiceUnavailable("File storage is not configured".to_string()))
}

pub(crate) fn validate_image_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<(), ApiError> {
    let extension = file_extension(filename)
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        ["jpg", "jpeg", "png", "webp"].iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn accepts_matching_extension_and_mime() {
        assert!(validate_image_upload("proof.PNG", "image/png", &allowed()).is_ok());
        assert!(validate_image_upload("me.jpg", "image/jpeg", &allowed()).is_ok());
    }

    #[test]
    fn rejects_disallowed_extension() {
        let err = validate_image_upload("notes.pdf", "application/pdf", &allowed()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("pdf")));
    }

    #[test]
    fn rejects_mime_mismatch_and_missing_extension() {
        assert!(validate_image_upload("proof.png", "image/jpeg", &allowed()).is_err());
        assert!(validate_image_upload("proof", "image/png", &allowed()).is_err());
    }

    #[test]
    fn uploaded_file_extension_is_lowercased() {
        let file = UploadedFile {
            filename: "Scan.JPEG".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1],
        };
        assert_eq!(file.extension(), "jpeg");
    }
}
