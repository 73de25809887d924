//! Admin identity types.

use serde::{Deserialize, Serialize};

/// Admin role.
///
/// Anyone who can sign in to the backend's auth service manages the catalog,
/// so there is a single role. Row-level policies on the backend are the
/// real authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
        }
    }
}
