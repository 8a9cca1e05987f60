//! Database repositories for data access layer
//!
//! One repository per table. Both take a cloned `PgPool` and return `AppError` on failure.

pub mod file_record;
pub mod subject;

pub use file_record::FileRecordRepository;
pub use subject::SubjectRepository;
