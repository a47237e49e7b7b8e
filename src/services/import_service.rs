// ==================== IMPORT ORCHESTRATOR ====================
// Arquivo -> linhas -> rascunhos -> dedup -> lote aceito -> insert_many

use crate::{
    database::UserStore,
    models::{UserDraft, UserRecord},
    services::{
        dedup::{DedupFilter, DedupMode},
        normalizer,
        parser::{self, FileKind},
    },
    utils::{error::AppError, thread_pool::spawn_parse_blocking},
};
use mongodb::bson::DateTime;
use serde::Serialize;

/// An uploaded file as received from the transport
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub import_id: String,
    pub files_processed: usize,
    pub rows_read: usize,
    pub accepted_count: usize,
    pub skipped_count: usize,
    pub accepted_records: Vec<UserDraft>,
}

/// Runs one import request. Files and rows are handled strictly in order;
/// the accepted batch is persisted with a single bulk insert at the end.
pub async fn import_files(
    store: &dyn UserStore,
    files: Vec<UploadedFile>,
    mode: DedupMode,
) -> Result<ImportSummary, AppError> {
    if files.is_empty() {
        return Err(AppError::InvalidRequest("No files uploaded".to_string()));
    }

    // Every file must have a known type before any of them is parsed
    let mut typed_files = Vec::with_capacity(files.len());
    for file in files {
        let kind = FileKind::from_filename(&file.filename)
            .ok_or_else(|| AppError::UnsupportedFile(file.filename.clone()))?;
        typed_files.push((kind, file));
    }

    let import_id = uuid::Uuid::new_v4().to_string();
    log::info!(
        "📥 Import {} started: {} file(s), dedup mode {}",
        import_id,
        typed_files.len(),
        mode
    );

    let mut filter = DedupFilter::new(mode);
    let mut accepted: Vec<UserDraft> = Vec::new();
    let mut rows_read = 0;
    let mut skipped_count = 0;
    let files_processed = typed_files.len();

    for (kind, file) in typed_files {
        let filename = file.filename;
        let bytes = file.bytes;

        let rows = spawn_parse_blocking(move || parser::parse_rows(kind, &bytes))
            .await
            .map_err(|e| AppError::ParseError(format!("Parse task failed: {}", e)))?
            .map_err(|e| {
                log::error!("❌ Failed to parse {}: {}", filename, e);
                e
            })?;

        rows_read += rows.len();
        let drafts: Vec<UserDraft> = rows.iter().map(normalizer::normalize).collect();

        let screened = filter.screen(store, drafts).await?;
        log::info!(
            "📄 {} ({}): {} rows, {} accepted, {} duplicates",
            filename,
            kind,
            rows.len(),
            screened.accepted.len(),
            screened.skipped
        );

        skipped_count += screened.skipped;
        accepted.extend(screened.accepted);
    }

    if !accepted.is_empty() {
        let now = DateTime::now();
        let records: Vec<UserRecord> = accepted
            .iter()
            .cloned()
            .map(|draft| UserRecord::from_draft(draft, now))
            .collect();

        let inserted = store.insert_many(records).await?;
        log::info!("💾 Import {}: {} users inserted", import_id, inserted);
    } else {
        log::info!("ℹ️  Import {}: nothing new to insert", import_id);
    }

    Ok(ImportSummary {
        import_id,
        files_processed,
        rows_read,
        accepted_count: accepted.len(),
        skipped_count,
        accepted_records: accepted,
    })
}
