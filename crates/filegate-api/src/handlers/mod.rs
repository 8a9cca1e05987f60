pub mod files;
pub mod health;
pub mod intake;
pub mod media;
pub mod rescan;
pub mod signed_url;
