use serde::{Deserialize, Serialize};

use crate::constants::SERVICE_PRINCIPAL_ID;

/// Authenticated caller, as resolved by the authorization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identity recorded as `uploaded_by`
    pub id: String,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn service() -> Self {
        Self::new(SERVICE_PRINCIPAL_ID)
    }

    pub fn is_service(&self) -> bool {
        self.id == SERVICE_PRINCIPAL_ID
    }
}
