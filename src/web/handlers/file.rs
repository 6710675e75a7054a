//! File handlers for the storage API.
//!
//! Every route is a wildcard over the storage root: the captured path is the
//! fragment handed to [`crate::file::FileStorage`]. Storage calls run on the
//! blocking pool.

use axum::{
    async_trait,
    body::Body,
    extract::{
        multipart::MultipartError, rejection::PathRejection, FromRequest, FromRequestParts,
        Multipart, Path, Query, Request, State,
    },
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use mime_guess::mime::{self, Mime};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::file::{CreateOutcome, FsError};
use crate::web::dto::{DeleteRequest, RenameRequest};
use crate::web::error::{ApiError, NOT_EMPTY_HINT};
use crate::web::handlers::AppState;

/// Path suffix that turns a GET into a download.
const DOWNLOAD_SUFFIX: &str = "/download";

/// Name of the wildcard segment in the router.
const WILDCARD: &str = "path";

/// Wildcard path fragment of the request. Empty for `/`.
#[derive(Debug, Clone)]
pub struct TargetPath(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TargetPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // `/` matches with an empty parameter list, so the map may lack the key.
        match Path::<HashMap<String, String>>::from_request_parts(parts, state).await {
            Ok(Path(mut params)) => Ok(TargetPath(params.remove(WILDCARD).unwrap_or_default())),
            Err(PathRejection::MissingPathParams(_)) => Ok(TargetPath(String::new())),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Text fields of a form body, urlencoded or multipart.
///
/// Any other body (or none) yields `T::default()`. File parts of a multipart
/// body are skipped; for repeated names the first value wins.
#[derive(Debug)]
pub struct FormFields<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormFields<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Mime>().ok());

        let Some(content_type) = content_type else {
            return Ok(FormFields(T::default()));
        };

        if content_type.type_() == mime::MULTIPART && content_type.subtype() == mime::FORM_DATA {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

            let mut fields = serde_json::Map::new();
            while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                if field.file_name().is_some() || fields.contains_key(&name) {
                    continue;
                }
                let value = field.text().await.map_err(multipart_error)?;
                fields.insert(name, serde_json::Value::String(value));
            }

            return serde_json::from_value(serde_json::Value::Object(fields))
                .map(FormFields)
                .map_err(|e| ApiError::bad_request(format!("Invalid form data: {e}")));
        }

        if content_type.type_() == mime::APPLICATION
            && content_type.subtype() == mime::WWW_FORM_URLENCODED
        {
            let Form(fields) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
            return Ok(FormFields(fields));
        }

        Ok(FormFields(T::default()))
    }
}

/// Run a storage call on the blocking pool.
async fn blocking<T, F>(task: F) -> Result<Result<T, FsError>, ApiError>
where
    F: FnOnce() -> Result<T, FsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        tracing::error!(error = %e, "Storage task failed");
        ApiError::internal("Storage task failed")
    })
}

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped and quotes/backslashes replaced in the
/// plain `filename`; non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!("attachment; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(err.body_text())
    } else {
        tracing::warn!(error = %err, "Failed to read multipart field");
        ApiError::bad_request(format!("Invalid multipart data: {}", err.body_text()))
    }
}

/// GET /*path - Folder tree, or `/*path/download` for file content.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    TargetPath(fragment): TargetPath,
) -> Result<Response, ApiError> {
    match fragment.strip_suffix(DOWNLOAD_SUFFIX) {
        Some(file) => download_file(state, file.to_string()).await,
        None => list_entry(state, fragment).await,
    }
}

async fn list_entry(state: Arc<AppState>, fragment: String) -> Result<Response, ApiError> {
    let tree = blocking(move || state.storage.list(&fragment))
        .await?
        .map_err(|e| ApiError::from_fs_lookup("Error getting folder structure", e))?;

    Ok(Json(tree).into_response())
}

async fn download_file(state: Arc<AppState>, fragment: String) -> Result<Response, ApiError> {
    let download = blocking(move || state.storage.download(&fragment))
        .await?
        .map_err(|e| ApiError::from_fs("Error downloading file", e))?;

    let content_type = mime_guess::from_path(&download.file_name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file_name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// PUT /*path - Create a folder and its missing parents.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    TargetPath(fragment): TargetPath,
) -> Result<&'static str, ApiError> {
    let outcome = blocking(move || state.storage.create_folder(&fragment))
        .await?
        .map_err(|e| ApiError::from_fs("Error creating folder", e))?;

    Ok(match outcome {
        CreateOutcome::AlreadyExisted => "Folder already exists",
        CreateOutcome::Created => "Folder created successfully",
    })
}

/// POST /*path - Upload a file into the folder.
///
/// Request body: multipart/form-data with a "file" field. The stored name is
/// the field's file name; an existing file is replaced.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    TargetPath(fragment): TargetPath,
    mut multipart: Multipart,
) -> Result<&'static str, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Error uploading file: missing file name"))?;
        let content = field.bytes().await.map_err(multipart_error)?;

        upload = Some((file_name, content));
        break;
    }

    let (file_name, content) = upload
        .ok_or_else(|| ApiError::bad_request("Error uploading file: no \"file\" field"))?;

    blocking(move || state.storage.upload(&fragment, &file_name, &content))
        .await?
        .map_err(|e| ApiError::from_fs("Error saving file", e))?;

    Ok("File uploaded successfully")
}

/// PATCH /*path - Rename or move to `newPath`.
///
/// `newPath` is read from the query string first, then from the form body.
pub async fn rename_entry(
    State(state): State<Arc<AppState>>,
    TargetPath(fragment): TargetPath,
    Query(query): Query<RenameRequest>,
    FormFields(body): FormFields<RenameRequest>,
) -> Result<&'static str, ApiError> {
    let request = query.or(body);

    let new_path = request
        .new_path
        .filter(|path| !path.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing form field \"newPath\""))?;

    blocking(move || state.storage.rename(&fragment, &new_path))
        .await?
        .map_err(|e| ApiError::from_fs("Error renaming", e))?;

    Ok("Renamed successfully")
}

/// DELETE /*path - Delete a file or folder.
///
/// Requires the delete secret in `password`; `force=true` deletes folders
/// recursively. Both are read from the query string first, then from the
/// form body. The secret is checked before the filesystem is touched.
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    TargetPath(fragment): TargetPath,
    Query(query): Query<DeleteRequest>,
    FormFields(body): FormFields<DeleteRequest>,
) -> Result<&'static str, ApiError> {
    let request = query.or(body);

    let password = request.password.as_deref().unwrap_or_default();
    if !state.credentials.verify(password) {
        tracing::warn!(path = %fragment, "Rejected delete with invalid password");
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let force = request.is_forced();
    let kind = blocking(move || state.storage.delete(&fragment, force))
        .await?
        .map_err(|e| {
            let not_empty = matches!(e, FsError::NotEmpty { .. });
            let err = ApiError::from_fs("Error deleting", e);
            if not_empty {
                err.with_hint(NOT_EMPTY_HINT)
            } else {
                err
            }
        })?;

    Ok(if kind.is_dir() {
        "Folder deleted successfully"
    } else {
        "File deleted successfully"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_header_simple_ascii() {
        let result = content_disposition_header("report.pdf");
        assert_eq!(result, "attachment; filename=\"report.pdf\"");
    }

    #[test]
    fn test_content_disposition_header_with_spaces() {
        let result = content_disposition_header("my document.txt");
        assert_eq!(result, "attachment; filename=\"my document.txt\"");
    }

    #[test]
    fn test_content_disposition_header_non_ascii() {
        let result = content_disposition_header("日本語ファイル.txt");
        assert!(result.starts_with("attachment; filename=\""));
        assert!(result.contains("filename*=UTF-8''"));
        assert!(result.contains("%E6%97%A5%E6%9C%AC%E8%AA%9E"));
    }

    #[test]
    fn test_content_disposition_header_double_quote() {
        let result = content_disposition_header("test\"file.txt");
        assert!(result.contains("filename=\"test_file.txt\""));
        assert!(result.contains("%22"));
    }

    #[test]
    fn test_content_disposition_header_control_characters() {
        let result = content_disposition_header("test\r\nX-Injected: bad.txt");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
        assert!(result.starts_with("attachment; filename="));
    }
}
