use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse, Responder, ResponseError};
use futures::TryStreamExt;
use serde::Serialize;

use super::{metrics, AppState};
use crate::{
    models::UserResponse,
    services::{
        export_service::{self, XLSX_CONTENT_TYPE},
        import_service::{self, ImportSummary, UploadedFile},
    },
    utils::error::AppError,
};

/// Multipart field carrying the uploads
pub const FILES_FIELD: &str = "files";

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportResponse {
    pub status: u16,
    pub success: bool,
    pub msg: String,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ListUsersResponse {
    pub status: u16,
    pub success: bool,
    pub data: Vec<UserResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub success: bool,
    pub msg: String,
}

/// Request body shape, for the OpenAPI document only
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct UploadForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}

/// Collects the `files` parts of the multipart body, enforcing the count and
/// size limits. Other parts are drained and ignored.
async fn read_uploads(
    mut payload: Multipart,
    max_files: usize,
    max_bytes: usize,
) -> Result<Vec<UploadedFile>, AppError> {
    let malformed = |e: actix_multipart::MultipartError| {
        AppError::InvalidRequest(format!("Malformed multipart body: {}", e))
    };

    let mut files = Vec::new();

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        let filename = match (name.as_deref(), filename) {
            (Some(FILES_FIELD), Some(filename)) => filename,
            _ => {
                while field.try_next().await.map_err(malformed)?.is_some() {}
                continue;
            }
        };

        if files.len() >= max_files {
            return Err(AppError::InvalidRequest(format!(
                "Too many files (max {})",
                max_files
            )));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::InvalidRequest(format!(
                    "File '{}' exceeds {} bytes",
                    filename, max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        log::debug!("📎 Received {} ({} bytes)", filename, bytes.len());
        files.push(UploadedFile { filename, bytes });
    }

    Ok(files)
}

fn failure(e: AppError, context: &str) -> HttpResponse {
    if e.is_client_error() {
        log::warn!("⚠️  {}: {}", context, e);
    } else {
        log::error!("❌ {}: {}", context, e);
        metrics::increment_error_count();
    }
    e.error_response()
}

/// POST /importUser - Importa usuários de arquivos .xlsx / .xls / .csv
#[utoipa::path(
    post,
    path = "/importUser",
    tag = "Users",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 400, description = "No files, too many files or unsupported type", body = ErrorResponse),
        (status = 500, description = "Parse or store failure", body = ErrorResponse)
    )
)]
pub async fn import_users(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let config = &state.config;

    let files = match read_uploads(payload, config.max_upload_files, config.max_upload_bytes).await {
        Ok(files) => files,
        Err(e) => return failure(e, "Rejected upload"),
    };

    log::info!("📥 POST /importUser - {} file(s)", files.len());

    match import_service::import_files(state.store.as_ref(), files, config.dedup_mode).await {
        Ok(summary) => {
            log::info!(
                "✅ Import {}: {} accepted, {} skipped",
                summary.import_id,
                summary.accepted_count,
                summary.skipped_count
            );
            metrics::record_import(summary.accepted_count, summary.skipped_count);
            HttpResponse::Ok().json(ImportResponse {
                status: 200,
                success: true,
                msg: "Data imported successfully".to_string(),
                summary,
            })
        }
        Err(e) => failure(e, "Import failed"),
    }
}

/// GET /users - Lista todos os usuários
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All stored users", body = ListUsersResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_users(state: web::Data<AppState>) -> impl Responder {
    match state.store.find_all().await {
        Ok(users) => {
            log::info!("📋 GET /users - {} users", users.len());
            HttpResponse::Ok().json(ListUsersResponse {
                status: 200,
                success: true,
                data: users.into_iter().map(UserResponse::from).collect(),
            })
        }
        Err(e) => failure(e, "Error fetching users"),
    }
}

/// GET /exportToExcel - Exporta todos os usuários como .xlsx
#[utoipa::path(
    get,
    path = "/exportToExcel",
    tag = "Users",
    responses(
        (status = 200, description = "Spreadsheet download (xlsx)"),
        (status = 500, description = "Store or export failure", body = ErrorResponse)
    )
)]
pub async fn export_to_excel(state: web::Data<AppState>) -> impl Responder {
    let users = match state.store.find_all().await {
        Ok(users) => users,
        Err(e) => return failure(e, "Error exporting to Excel"),
    };

    let bytes = match export_service::build_workbook(&users) {
        Ok(bytes) => bytes,
        Err(e) => return failure(e, "Error exporting to Excel"),
    };

    let filename = export_service::export_filename(chrono::Utc::now());
    log::info!("📤 GET /exportToExcel - {} users -> {}", users.len(), filename);
    metrics::increment_export_count();

    HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", filename),
        ))
        .body(bytes)
}
