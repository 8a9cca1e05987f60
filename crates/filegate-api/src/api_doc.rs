//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::services;
use filegate_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Filegate API",
        version = "0.1.0",
        description = "Gated file intake: uploaded objects are scanned for malware before they are recorded, and downloads go through short-lived signed URLs."
    ),
    paths(
        handlers::intake::intake,
        handlers::rescan::rescan,
        handlers::signed_url::create_signed_url,
        handlers::files::list_subject_files,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::FileRecord,
            models::ScanOutcome,
            models::ScanVerdict,
            services::UploadRequest,
            services::RescanRequest,
            services::RescanResult,
            services::SignedUrlRequest,
            services::SignedUrlResponse,
            handlers::intake::IntakeResponse,
            handlers::files::FileListResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "intake", description = "Upload intake and re-scan"),
        (name = "retrieval", description = "Signed download URLs"),
        (name = "files", description = "File records"),
        (name = "health", description = "Health checks")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
