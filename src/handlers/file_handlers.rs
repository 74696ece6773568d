//! HTTP handlers for file and custody operations.
//! Every handler resolves the caller through [`Actor`] and delegates to
//! `VaultService`.

use crate::{
    errors::AppError,
    handlers::actor::Actor,
    models::{AccessUserList, AssetHistoryEntry, FileAsset, KeyAsset},
    routes::routes::AppState,
};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub const FILE_NAME_HEADER: &str = "x-file-name";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub content_address: String,
    pub version: u64,
}

#[derive(Debug, Deserialize)]
pub struct DownloadReq {
    pub shares: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccessReq {
    pub access_user_list: AccessUserList,
}

#[derive(Debug, Deserialize)]
pub struct TransferReq {
    pub new_owner: String,
}

#[derive(Debug, Deserialize)]
pub struct CustodiansReq {
    pub custodians: Vec<String>,
}

/// `POST /files`: encrypt, escrow and register the request body.
pub async fn upload_file(
    State(service): State<AppState>,
    Actor(actor): Actor,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request("No file uploaded"));
    }
    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("missing {FILE_NAME_HEADER} header")))?
        .to_string();
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let receipt = service
        .upload(&actor, &file_name, &mime_type, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_id: receipt.file_id,
            content_address: receipt.content_address,
            version: receipt.version,
        }),
    ))
}

/// `GET /files`: records the caller is granted on.
pub async fn list_files(
    State(service): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<FileAsset>>, AppError> {
    Ok(Json(service.list_accessible(&actor).await?))
}

/// `POST /files/{file_id}/download`: decrypt with caller-supplied shares.
pub async fn download_file(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(file_id): Path<String>,
    Json(req): Json<DownloadReq>,
) -> Result<Response, AppError> {
    let file = service.download(&actor, &file_id, &req.shares).await?;

    let etag = format!("\"{:x}\"", md5::compute(&file.content));
    let length = file.content.len();
    let mut response = Response::new(Body::from(file.content));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&file.record.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&length.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file.record.file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, value);
    }

    Ok(response)
}

/// `GET /files/{file_id}/history`
pub async fn file_history(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(file_id): Path<String>,
) -> Result<Json<Vec<AssetHistoryEntry<FileAsset>>>, AppError> {
    Ok(Json(service.history(&actor, &file_id).await?))
}

/// `PUT /files/{file_id}/access`: replace the access list.
pub async fn update_access(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(file_id): Path<String>,
    Json(req): Json<AccessReq>,
) -> Result<Json<FileAsset>, AppError> {
    Ok(Json(
        service
            .update_access(&actor, &file_id, req.access_user_list)
            .await?,
    ))
}

/// `POST /files/{file_id}/transfer`
pub async fn transfer_file(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(file_id): Path<String>,
    Json(req): Json<TransferReq>,
) -> Result<Json<FileAsset>, AppError> {
    Ok(Json(
        service.transfer(&actor, &file_id, &req.new_owner).await?,
    ))
}

/// `DELETE /files/{file_id}`: owner only; history is kept.
pub async fn delete_file(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(&actor, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /files/{file_id}/custodians`: one custody record per custodian.
pub async fn distribute_shares(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(file_id): Path<String>,
    Json(req): Json<CustodiansReq>,
) -> Result<impl IntoResponse, AppError> {
    let created = service
        .distribute_shares(&actor, &file_id, &req.custodians)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /keys/{*key_id}`: a custodian reading their own share.
pub async fn custodian_share(
    State(service): State<AppState>,
    Actor(actor): Actor,
    Path(key_id): Path<String>,
) -> Result<Json<KeyAsset>, AppError> {
    Ok(Json(service.custodian_share(&actor, &key_id).await?))
}

/// `attachment; filename="..."` with quotes and control characters dropped.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
