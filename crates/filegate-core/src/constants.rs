/// Upper bound on accepted uploads unless `MAX_FILE_SIZE_MB` says otherwise (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Lifetime of a download handle when the caller does not ask for one.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 60;

/// Longest lifetime a download handle may be issued for (S3 presigning limit).
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Diagnostic stored in `scan_output` when the engine could not be reached and
/// scanning is not required.
pub const SKIPPED_SCAN_MARKER: &str = "skipped";

/// Principal assigned to callers presenting the static service key.
pub const SERVICE_PRINCIPAL_ID: &str = "service";
