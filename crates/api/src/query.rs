//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?with_trashed=true` on list endpoints includes soft-deleted rows.
#[derive(Debug, Default, Deserialize)]
pub struct WithTrashedParams {
    #[serde(default)]
    pub with_trashed: bool,
}
