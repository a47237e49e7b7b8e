use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Import Service API",
        version = "1.0.0",
        description = "Imports users from .xlsx, .xls and .csv files, skipping rows whose email or mobile number already exists, and exports the stored users as a spreadsheet."
    ),
    paths(
        // Users
        crate::api::users::import_users,
        crate::api::users::list_users,
        crate::api::users::export_to_excel,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::api::users::ImportResponse,
            crate::api::users::ListUsersResponse,
            crate::api::users::ErrorResponse,
            crate::api::users::UploadForm,
            crate::services::import_service::ImportSummary,
            crate::models::UserDraft,
            crate::models::UserResponse,

            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Users", description = "Spreadsheet import, listing and export of users."),
        (name = "Health", description = "Health check and counters for monitoring service status."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_user_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/importUser", "/users", "/exportToExcel", "/health", "/metrics"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
