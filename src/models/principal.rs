//! The actor behind a request, as reported by the identity provider.

use serde::{Deserialize, Serialize};

use super::file::{ANONYMOUS_OWNER, File};

/// An authenticated caller. Anonymous callers are represented by `None`
/// wherever a principal is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

/// Effective id of a possibly anonymous caller.
pub fn principal_id(principal: Option<&Principal>) -> &str {
    principal.map(|p| p.id.as_str()).unwrap_or(ANONYMOUS_OWNER)
}

/// Ownership policy for mutating a file.
///
/// The caller owns `file` when its id matches either `user_id` or
/// `owner_id`. Files uploaded without an authenticated user have no
/// `user_id` and no enforced owner: every caller passes.
pub fn is_owner(principal: Option<&Principal>, file: &File) -> bool {
    let Some(user_id) = file.user_id.as_deref() else {
        return true;
    };
    let id = principal_id(principal);
    user_id == id || file.owner_id == id
}
