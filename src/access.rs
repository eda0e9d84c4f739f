//! Role-based visibility rules, kept in one place so that handlers never
//! branch on roles themselves.

use crate::error::ApiError;
use crate::models::{Role, UserSummary};

/// Who is making a request, as resolved from the bearer credential.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    /// No credential was presented.
    Anonymous,
    /// A credential was presented but is unknown or expired.
    Invalid,
    Authenticated(UserSummary),
}

impl Caller {
    pub fn role(&self) -> Option<Role> {
        match self {
            Caller::Authenticated(user) => Some(user.role),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    InvalidCredential,
    InsufficientRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzDecision {
    Allow,
    Deny(DenyReason),
}

impl AuthzDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthzDecision::Allow)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            AuthzDecision::Allow => Ok(()),
            AuthzDecision::Deny(DenyReason::Unauthenticated) => Err(ApiError::Unauthenticated),
            AuthzDecision::Deny(DenyReason::InvalidCredential) => Err(ApiError::InvalidCredential),
            AuthzDecision::Deny(DenyReason::InsufficientRole) => Err(ApiError::PermissionDenied),
        }
    }
}

fn require_admin(caller: &Caller) -> AuthzDecision {
    match caller {
        Caller::Anonymous => AuthzDecision::Deny(DenyReason::Unauthenticated),
        Caller::Invalid => AuthzDecision::Deny(DenyReason::InvalidCredential),
        Caller::Authenticated(user) if user.role == Role::Admin => AuthzDecision::Allow,
        Caller::Authenticated(_) => AuthzDecision::Deny(DenyReason::InsufficientRole),
    }
}

/// Festival-wide statistics are admin only.
pub fn authorize_global_stats(caller: &Caller) -> AuthzDecision {
    require_admin(caller)
}

/// Booth statistics feed the public display screen at each booth, so any
/// caller may read them, with or without a credential.
pub fn authorize_booth_stats(_caller: &Caller, _booth_id: i32) -> AuthzDecision {
    AuthzDecision::Allow
}

/// Creating and deleting booths is admin only.
pub fn authorize_manage_booths(caller: &Caller) -> AuthzDecision {
    require_admin(caller)
}
