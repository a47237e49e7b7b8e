use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static IMPORT_COUNT: AtomicU64 = AtomicU64::new(0);
static ACCEPTED_COUNT: AtomicU64 = AtomicU64::new(0);
static SKIPPED_COUNT: AtomicU64 = AtomicU64::new(0);
static EXPORT_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn record_import(accepted: usize, skipped: usize) {
    IMPORT_COUNT.fetch_add(1, Ordering::Relaxed);
    ACCEPTED_COUNT.fetch_add(accepted as u64, Ordering::Relaxed);
    SKIPPED_COUNT.fetch_add(skipped as u64, Ordering::Relaxed);
}

pub fn increment_export_count() {
    EXPORT_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub imports_total: u64,
    pub records_accepted_total: u64,
    pub records_skipped_total: u64,
    pub exports_total: u64,
    pub errors_total: u64,
}

fn snapshot() -> MetricsResponse {
    MetricsResponse {
        imports_total: IMPORT_COUNT.load(Ordering::Relaxed),
        records_accepted_total: ACCEPTED_COUNT.load(Ordering::Relaxed),
        records_skipped_total: SKIPPED_COUNT.load(Ordering::Relaxed),
        exports_total: EXPORT_COUNT.load(Ordering::Relaxed),
        errors_total: ERROR_COUNT.load(Ordering::Relaxed),
    }
}

fn render(m: &MetricsResponse) -> String {
    format!(
        "# HELP imports_total Import requests completed\n\
         # TYPE imports_total counter\n\
         imports_total {}\n\
         \n\
         # HELP records_accepted_total Rows persisted by imports\n\
         # TYPE records_accepted_total counter\n\
         records_accepted_total {}\n\
         \n\
         # HELP records_skipped_total Rows dropped as duplicates\n\
         # TYPE records_skipped_total counter\n\
         records_skipped_total {}\n\
         \n\
         # HELP exports_total Spreadsheet exports served\n\
         # TYPE exports_total counter\n\
         exports_total {}\n\
         \n\
         # HELP errors_total Requests that failed with an internal error\n\
         # TYPE errors_total counter\n\
         errors_total {}\n",
        m.imports_total,
        m.records_accepted_total,
        m.records_skipped_total,
        m.exports_total,
        m.errors_total
    )
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text counters")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render(&snapshot()))
}
